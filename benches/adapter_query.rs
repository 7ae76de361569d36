// SPDX-License-Identifier: AGPL-3.0-or-later
//! Benchmark for GPU adapter enumeration.
//!
//! Measures the cost of listing adapters through the platform backend
//! (DXGI on Windows, NVML on Linux with the `nvidia` feature).

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_enumerate_adapters(c: &mut Criterion) {
    c.bench_function("enumerate_adapters", |b| {
        b.iter(|| {
            let _ = onnxbench::device::enumerate_adapters();
        });
    });
}

criterion_group!(benches, bench_enumerate_adapters);
criterion_main!(benches);
