use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ferric_fd::core::PricingEngine;
use ferric_fd::engines::pde::ExplicitFdEngine;
use ferric_fd::fd::grid::uniform_grid;
use ferric_fd::fd::operators::{heat_operator, time_dependent_heat_operator};
use ferric_fd::fd::{ExplicitEuler, LinearOperator, Scheme};
use ferric_fd::instruments::VanillaOption;
use ferric_fd::market::Market;
use std::hint::black_box;

// Performance goals (guideline, measured on target hardware):
// - explicit step on 1000 nodes: < 5 us
// - time-dependent step on 1000 nodes: < 20 us
// - American put, 2000 x 120 explicit FD: < 5 ms

fn benchmark_market() -> Market {
    Market::builder()
        .spot(100.0)
        .rate(0.05)
        .dividend_yield(0.0)
        .flat_vol(0.20)
        .build()
        .expect("benchmark market should be valid")
}

fn bench_explicit_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("explicit_euler_step");
    for &nodes in &[100_usize, 1_000, 10_000] {
        let grid = uniform_grid(nodes - 1, 0.0, 1.0).expect("grid should be valid");
        let op = heat_operator(&grid, 1.0).expect("operator should be valid");
        let dt = 0.4 * op.stability_dt_max().expect("bound should exist");
        let mut scheme = ExplicitEuler::new(op).expect("scheme should build");
        scheme.set_step(dt).expect("step should be valid");
        let mut state = grid
            .iter()
            .map(|x| (std::f64::consts::PI * x).sin())
            .collect::<Vec<_>>();

        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| {
                scheme
                    .step(black_box(&mut state), black_box(0.0))
                    .expect("step should succeed");
            })
        });
    }
    group.finish();
}

fn bench_time_dependent_step(c: &mut Criterion) {
    let grid = uniform_grid(999, 0.0, 1.0).expect("grid should be valid");
    let op = time_dependent_heat_operator(&grid, |t| 1.0 + 0.5 * t)
        .expect("operator should be valid");
    let mut scheme = ExplicitEuler::new(op).expect("scheme should build");
    scheme.set_step(1.0e-7).expect("step should be valid");
    let mut state = vec![1.0; grid.len()];
    let mut t = 0.0;

    c.bench_function("explicit_euler_time_dependent_step_1000", |b| {
        b.iter(|| {
            t += 1.0e-7;
            scheme
                .step(black_box(&mut state), black_box(t))
                .expect("step should succeed");
        })
    });
}

fn bench_explicit_fd_american_put(c: &mut Criterion) {
    let market = benchmark_market();
    let option = VanillaOption::american_put(100.0, 1.0);
    let engine = ExplicitFdEngine::new(2_000, 120);

    c.bench_function("explicit_fd_american_put_2000x120", |b| {
        b.iter(|| {
            let px = engine
                .price(black_box(&option), black_box(&market))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

criterion_group!(
    benches,
    bench_explicit_step,
    bench_time_dependent_step,
    bench_explicit_fd_american_put
);
criterion_main!(benches);
