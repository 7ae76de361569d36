// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Model loading, input binding and evaluation on ONNX Runtime
//!
//! Execution providers:
//!
//! - CPU: always available
//! - DirectML (Windows): `device_id` is the DXGI adapter ordinal
//! - CUDA (Linux, `nvidia` feature): `device_id` is the NVML/CUDA ordinal

use crate::bench::Evaluator;
use crate::config::{BenchConfig, OptimizationLevel};
use crate::device::{AdapterBackend, ExecutionDevice};
use crate::error::{BenchError, Result};
use crate::shape::{checked_element_count, InputSpec};
use ndarray::{ArrayD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use std::path::{Path, PathBuf};

fn graph_optimization_level(level: OptimizationLevel) -> GraphOptimizationLevel {
    match level {
        OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
        OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
        OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
        OptimizationLevel::All => GraphOptimizationLevel::Level3,
    }
}

/// The tensor currently bound to the model's first input
struct BoundInput {
    tensor: Tensor<f32>,
}

/// A loaded model with a session on one execution device
pub struct ModelSession {
    session: Session,
    model_path: PathBuf,
    input: InputSpec,
    outputs: Vec<String>,
    bound: Option<BoundInput>,
}

impl ModelSession {
    /// Load `config.model_path` and create a session on `device`.
    pub fn load(config: &BenchConfig, device: &ExecutionDevice) -> Result<Self> {
        let model_path = config.model_path.clone();
        ensure_model_exists(&model_path)?;

        log::info!("Loading modelfile '{}' on {}", model_path.display(), device.label());

        let builder = Session::builder()?
            .with_optimization_level(graph_optimization_level(config.optimization))?;
        let builder = match config.intra_threads {
            Some(threads) => builder.with_intra_threads(threads)?,
            None => builder,
        };
        let builder = configure_device(builder, device)?;
        let session = builder.commit_from_file(&model_path)?;

        let input = describe_first_input(&session)?;
        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        log::info!(
            "Model loaded: input '{}' {:?}, outputs {:?}",
            input.name,
            input.dims,
            outputs
        );

        Ok(Self {
            session,
            model_path,
            input,
            outputs,
            bound: None,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// The model's first input, which is the one that gets bound
    pub fn input(&self) -> &InputSpec {
        &self.input
    }

    pub fn output_names(&self) -> &[String] {
        &self.outputs
    }

    /// Create a zero-filled f32 tensor of `shape` and bind it to the first input.
    ///
    /// Non-positive dimensions and shapes above
    /// [`MAX_INPUT_ELEMENTS`](crate::shape::MAX_INPUT_ELEMENTS) are
    /// rejected before anything is allocated.
    pub fn bind(&mut self, shape: &[i64]) -> Result<()> {
        checked_element_count(shape)?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        let tensor = Tensor::from_array(ArrayD::<f32>::zeros(IxDyn(&dims)))?;
        log::debug!("Bound '{}' to a {:?} f32 tensor", self.input.name, shape);
        self.bound = Some(BoundInput { tensor });
        Ok(())
    }

    /// Run the session once on the bound input and discard the outputs.
    pub fn run_once(&self) -> Result<()> {
        let bound = self
            .bound
            .as_ref()
            .ok_or_else(|| BenchError::Model("no input tensor bound".into()))?;
        let outputs = self
            .session
            .run(vec![(self.input.name.as_str(), bound.tensor.view())])?;
        drop(outputs);
        Ok(())
    }
}

impl Evaluator for ModelSession {
    fn evaluate(&mut self) -> Result<()> {
        self.run_once()
    }
}

/// The "model file absent" check done before any runtime call
pub fn ensure_model_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BenchError::ModelNotFound(path.to_path_buf()))
    }
}

fn describe_first_input(session: &Session) -> Result<InputSpec> {
    let input = session
        .inputs
        .first()
        .ok_or_else(|| BenchError::Model("model has no inputs".into()))?;

    match &input.input_type {
        ValueType::Tensor {
            ty,
            dimensions,
            dimension_symbols,
        } => {
            if *ty != TensorElementType::Float32 {
                return Err(BenchError::Model(format!(
                    "input '{}' has element type {:?}, only float32 inputs can be bound",
                    input.name, ty
                )));
            }
            Ok(InputSpec {
                name: input.name.clone(),
                dims: dimensions.clone(),
                symbols: dimension_symbols.clone(),
            })
        }
        other => Err(BenchError::Model(format!(
            "input '{}' is not a tensor ({:?})",
            input.name, other
        ))),
    }
}

fn configure_device(builder: SessionBuilder, device: &ExecutionDevice) -> Result<SessionBuilder> {
    match device {
        ExecutionDevice::Cpu => {
            Ok(builder.with_execution_providers([CPUExecutionProvider::default().build()])?)
        }
        ExecutionDevice::Gpu(adapter) => {
            let device_id = i32::try_from(adapter.index).map_err(|_| {
                BenchError::DeviceNotFound(format!("adapter index {} out of range", adapter.index))
            })?;
            match adapter.backend {
                AdapterBackend::Dxgi => with_directml(builder, device_id),
                AdapterBackend::Nvml => with_cuda(builder, device_id),
            }
        }
    }
}

#[cfg(windows)]
fn with_directml(builder: SessionBuilder, device_id: i32) -> Result<SessionBuilder> {
    use ort::execution_providers::DirectMLExecutionProvider;

    // DirectML does not support memory patterns or parallel execution
    let builder = builder
        .with_memory_pattern(false)?
        .with_parallel_execution(false)?;
    Ok(builder.with_execution_providers([DirectMLExecutionProvider::default()
        .with_device_id(device_id)
        .build()
        .error_on_failure()])?)
}

#[cfg(not(windows))]
fn with_directml(_builder: SessionBuilder, device_id: i32) -> Result<SessionBuilder> {
    Err(BenchError::GpuError(format!(
        "DXGI adapter {} needs DirectML, which is only available on Windows",
        device_id
    )))
}

#[cfg(all(target_os = "linux", feature = "nvidia"))]
fn with_cuda(builder: SessionBuilder, device_id: i32) -> Result<SessionBuilder> {
    use ort::execution_providers::CUDAExecutionProvider;

    Ok(builder.with_execution_providers([CUDAExecutionProvider::default()
        .with_device_id(device_id)
        .build()
        .error_on_failure()])?)
}

#[cfg(not(all(target_os = "linux", feature = "nvidia")))]
fn with_cuda(_builder: SessionBuilder, device_id: i32) -> Result<SessionBuilder> {
    Err(BenchError::GpuError(format!(
        "NVML adapter {} needs the CUDA execution provider (build with --features nvidia on Linux)",
        device_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::run_benchmark;
    use crate::shape::{resolve_input_shape, ShapeRequest};

    #[test]
    fn test_missing_model_is_reported_before_loading() {
        let config = BenchConfig {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            ..Default::default()
        };
        let err = ModelSession::load(&config, &ExecutionDevice::Cpu)
            .err()
            .expect("load should fail");
        assert!(err.is_model_not_found());
    }

    #[test]
    fn test_directory_is_not_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_model_exists(dir.path()).unwrap_err();
        assert!(matches!(err, BenchError::ModelNotFound(_)));
    }

    #[test]
    fn test_existing_file_passes_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"").unwrap();
        assert!(ensure_model_exists(&path).is_ok());
    }

    #[test]
    fn test_optimization_level_mapping() {
        assert!(matches!(
            graph_optimization_level(OptimizationLevel::Disable),
            GraphOptimizationLevel::Disable
        ));
        assert!(matches!(
            graph_optimization_level(OptimizationLevel::All),
            GraphOptimizationLevel::Level3
        ));
    }

    const IDENTITY_HWC: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/identity_hwc.onnx");
    const IDENTITY_INT64: &str =
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/identity_int64.onnx");

    fn cpu_config(model: &str) -> BenchConfig {
        BenchConfig {
            model_path: PathBuf::from(model),
            input_width: 64,
            input_height: 32,
            ..Default::default()
        }
    }

    fn load_identity() -> (BenchConfig, ModelSession) {
        let config = cpu_config(IDENTITY_HWC);
        let session = ModelSession::load(&config, &ExecutionDevice::Cpu).unwrap();
        (config, session)
    }

    #[test]
    fn test_load_describes_symbolic_input() {
        let (_, session) = load_identity();
        let input = session.input();
        assert_eq!(input.name, "x");
        assert_eq!(input.dims.len(), 3);
        assert!(input.dims[0] <= 0);
        assert!(input.dims[1] <= 0);
        assert_eq!(input.dims[2], 3);
        assert_eq!(input.symbols[0].as_deref(), Some("input_cx"));
        assert_eq!(input.symbols[1].as_deref(), Some("input_cy"));
        assert_eq!(session.output_names(), ["y".to_string()]);
        assert_eq!(session.model_path(), Path::new(IDENTITY_HWC));
    }

    #[test]
    fn test_resolved_shape_binds_and_runs() {
        let (config, mut session) = load_identity();
        let shape = resolve_input_shape(session.input(), &ShapeRequest::from_config(&config))
            .unwrap();
        assert_eq!(shape, vec![32, 64, 3]);

        session.bind(&shape).unwrap();
        let mut seen = 0;
        let samples = run_benchmark(&mut session, 1, 3, |_, _| seen += 1).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_run_without_bound_input_fails() {
        let (_, session) = load_identity();
        let err = session.run_once().unwrap_err();
        assert!(matches!(err, BenchError::Model(_)));
    }

    #[test]
    fn test_bind_rejects_zero_dimension() {
        let (_, mut session) = load_identity();
        let err = session.bind(&[0, 3]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument(_)));
        assert!(session.run_once().is_err());
    }

    #[test]
    fn test_bind_rejects_oversized_shape_without_allocating() {
        let (_, mut session) = load_identity();
        let huge = i64::from(u32::MAX & !31);
        let err = session.bind(&[huge, huge, 3]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument(_)));
    }

    #[test]
    fn test_non_float_input_is_rejected() {
        let err = ModelSession::load(&cpu_config(IDENTITY_INT64), &ExecutionDevice::Cpu)
            .err()
            .expect("int64 input should be rejected");
        match err {
            BenchError::Model(msg) => assert!(msg.contains("float32"), "{}", msg),
            other => panic!("unexpected error: {}", other),
        }
    }
}
