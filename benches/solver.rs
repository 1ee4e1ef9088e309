use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pertsol::evaluate::{sample, GridOptions};
use pertsol::prelude::*;
use std::hint::black_box;

fn bench_deterministic_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("deterministic_solve");
    for order in [2, 5, 8] {
        let params = ModelParams::deterministic_reference().with_order(order);
        let model = GrowthModel::deterministic(params).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(order), &model, |b, model| {
            b.iter(|| {
                let solution = solve(black_box(model)).unwrap();
                black_box(solution);
            });
        });
    }
    group.finish();
}

fn bench_stochastic_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("stochastic_solve");
    group.sample_size(10);
    for order in [2, 3, 4] {
        let params = ModelParams::stochastic_reference().with_order(order);
        let model = GrowthModel::stochastic(params).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(order), &model, |b, model| {
            b.iter(|| {
                let solution = solve(black_box(model)).unwrap();
                black_box(solution);
            });
        });
    }
    group.finish();
}

fn bench_residual_sampling(c: &mut Criterion) {
    let model = GrowthModel::stochastic(ModelParams::stochastic_reference()).unwrap();
    let solution = solve(&model).unwrap();
    let residual = ResidualFunction::new(&solution).unwrap();
    let grid = GridOptions::for_variant(Variant::Stochastic);

    c.bench_function("stochastic_residual_surface_100x100", |b| {
        b.iter(|| {
            let sampled = sample(black_box(&residual), black_box(&grid)).unwrap();
            black_box(sampled);
        });
    });
}

criterion_group!(
    benches,
    bench_deterministic_orders,
    bench_stochastic_orders,
    bench_residual_sampling
);
criterion_main!(benches);
