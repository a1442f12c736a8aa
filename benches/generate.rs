//! Benchmarks for CPU-side particle field generation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use galaxia::{GalaxyParams, ParticleField, RenderMode};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for count in [10_000u32, 50_000, 200_000] {
        let params = GalaxyParams {
            count,
            ..GalaxyParams::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &params, |b, params| {
            b.iter(|| {
                let mut rng = SmallRng::seed_from_u64(42);
                black_box(ParticleField::generate(black_box(params), &mut rng).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_interleave(c: &mut Criterion) {
    let params = GalaxyParams {
        count: 50_000,
        ..GalaxyParams::default()
    };
    let mut rng = SmallRng::seed_from_u64(42);
    let field = ParticleField::generate(&params, &mut rng).unwrap();

    let mut group = c.benchmark_group("to_instances");
    group.bench_function("animated_50k", |b| {
        b.iter(|| black_box(field.to_instances(RenderMode::Animated)))
    });
    group.bench_function("classic_50k", |b| {
        b.iter(|| black_box(field.to_instances(RenderMode::Classic)))
    });
    group.finish();
}

criterion_group!(benches, bench_generate, bench_interleave);
criterion_main!(benches);
