// SPDX-License-Identifier: AGPL-3.0-or-later
//! Benchmark for latency summary and input shape resolution.
//!
//! Both run once per benchmark session, but a long run (100k samples)
//! should not add noticeable time after the timed loop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use onnxbench::config::BenchConfig;
use onnxbench::report::LatencyStats;
use onnxbench::shape::{resolve_input_shape, InputSpec, ShapeRequest};
use std::time::Duration;

fn bench_latency_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_stats");
    for count in [1_000usize, 100_000] {
        // Deterministic spread of 1-20 ms
        let samples: Vec<Duration> = (0..count)
            .map(|i| Duration::from_micros(1_000 + ((i * 7_919) % 19_000) as u64))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &samples, |b, s| {
            b.iter(|| LatencyStats::from_samples(black_box(s)));
        });
    }
    group.finish();
}

fn bench_resolve_shape(c: &mut Criterion) {
    let input = InputSpec {
        name: "images".into(),
        dims: vec![-1, 3, -1, -1],
        symbols: vec![Some("batch".into()), None, Some("input_cx".into()), Some("input_cy".into())],
    };
    let request = ShapeRequest::from_config(&BenchConfig::default());
    c.bench_function("resolve_input_shape", |b| {
        b.iter(|| resolve_input_shape(black_box(&input), black_box(&request)));
    });
}

criterion_group!(benches, bench_latency_stats, bench_resolve_shape);
criterion_main!(benches);
