//! Criterion micro-benchmarks for cached geometry and alignment.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use detgeo_bench::{barrel_manager, REFERENCE};
use detgeo_geometry::AlignmentDelta;
use glam::{DAffine3, DVec3};

/// Benchmark: read every center from a warm cache.
fn bench_warm_centers(c: &mut Criterion) {
    let m = barrel_manager(REFERENCE);
    m.update_all();
    c.bench_function("warm_centers_11k", |b| {
        b.iter(|| {
            for e in m.elements() {
                black_box(e.center());
            }
        });
    });
}

/// Benchmark: invalidate, then recompute every bundle on first read.
fn bench_cold_centers(c: &mut Criterion) {
    let m = barrel_manager(REFERENCE);
    c.bench_function("cold_centers_11k", |b| {
        b.iter(|| {
            m.invalidate_all();
            for e in m.elements() {
                black_box(e.center());
            }
        });
    });
}

/// Benchmark: one global delta per layer, then a full invalidation.
fn bench_layer_alignment_batch(c: &mut Criterion) {
    let m = barrel_manager(REFERENCE);
    let layers: Vec<_> = (0..REFERENCE.layers)
        .map(|l| m.helper().compose(&[l]).unwrap())
        .collect();
    let shift = DAffine3::from_translation(DVec3::new(0.0, 0.0, 0.01));
    c.bench_function("layer_alignment_batch", |b| {
        b.iter(|| {
            let batch = layers.iter().map(|&id| AlignmentDelta::global(2, id, shift));
            black_box(m.apply_deltas(batch));
        });
    });
}

/// Benchmark: build the full reference detector from records.
fn bench_build_reference_detector(c: &mut Criterion) {
    c.bench_function("build_reference_detector", |b| {
        b.iter(|| black_box(barrel_manager(REFERENCE)));
    });
}

criterion_group!(
    benches,
    bench_warm_centers,
    bench_cold_centers,
    bench_layer_alignment_batch,
    bench_build_reference_detector,
);
criterion_main!(benches);
