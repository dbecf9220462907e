use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::num::NonZeroUsize;

use prw_math::{clamp_triple, interpolate_linear, select_samples};

fn bench_select_samples(c: &mut Criterion) {
    let stride = NonZeroUsize::new(20).unwrap();
    c.bench_function("select_samples_10k", |b| {
        b.iter(|| select_samples(black_box(10_000), stride))
    });
}

fn bench_interpolate(c: &mut Criterion) {
    c.bench_function("interpolate_linear", |b| {
        b.iter(|| {
            interpolate_linear(
                black_box(1234),
                black_box(5678),
                black_box(0.0),
                black_box(86_400.0),
                black_box(12_345.0),
            )
        })
    });
}

fn bench_clamp(c: &mut Criterion) {
    c.bench_function("clamp_triple", |b| {
        b.iter(|| clamp_triple(black_box(100), black_box(80), black_box(50)))
    });
}

criterion_group!(benches, bench_select_samples, bench_interpolate, bench_clamp);
criterion_main!(benches);
