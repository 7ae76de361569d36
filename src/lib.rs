// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! ONNX Bench: inference latency measurement for ONNX models
//!
//! Loads one model through ONNX Runtime, binds a zero-filled tensor to its
//! first input and times repeated evaluations on the CPU or on a GPU adapter.
//!
//! ```no_run
//! use onnxbench::{bench, config::BenchConfig, device::ExecutionDevice};
//! use onnxbench::{report::LatencyStats, session::ModelSession, shape};
//!
//! # fn main() -> onnxbench::Result<()> {
//! let config = BenchConfig::default().normalized()?;
//! let mut session = ModelSession::load(&config, &ExecutionDevice::Cpu)?;
//! let input_shape =
//!     shape::resolve_input_shape(session.input(), &shape::ShapeRequest::from_config(&config))?;
//! session.bind(&input_shape)?;
//!
//! let samples = bench::run_benchmark(&mut session, config.warmup, config.iterations, |_, _| {})?;
//! if let Some(stats) = LatencyStats::from_samples(&samples) {
//!     println!("mean {:?}", stats.mean);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bench;
pub mod config;
pub mod device;
pub mod error;
pub mod prompt;
pub mod report;
pub mod session;
pub mod shape;

pub use error::{BenchError, Result};
