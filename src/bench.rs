// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Timed evaluation loop

use crate::error::Result;
use std::time::{Duration, Instant};

/// Something that can run one inference with its inputs already bound
pub trait Evaluator {
    fn evaluate(&mut self) -> Result<()>;
}

impl<F> Evaluator for F
where
    F: FnMut() -> Result<()>,
{
    fn evaluate(&mut self) -> Result<()> {
        self()
    }
}

/// Run `warmup` untimed evaluations, then `iterations` timed ones.
///
/// `on_sample` sees each timed call as `(iteration, elapsed)` right after it
/// returns. The first failing evaluation aborts the run.
pub fn run_benchmark<E, F>(
    evaluator: &mut E,
    warmup: u32,
    iterations: u32,
    mut on_sample: F,
) -> Result<Vec<Duration>>
where
    E: Evaluator + ?Sized,
    F: FnMut(u32, Duration),
{
    for i in 0..warmup {
        log::debug!("Warm-up evaluation {}/{}", i + 1, warmup);
        evaluator.evaluate()?;
    }

    let mut samples = Vec::with_capacity(iterations as usize);
    for i in 0..iterations {
        let start = Instant::now();
        evaluator.evaluate()?;
        let elapsed = start.elapsed();
        samples.push(elapsed);
        on_sample(i, elapsed);
    }

    log::debug!("Collected {} samples", samples.len());
    Ok(samples)
}
