//! Criterion benchmarks for the rank-maximal solver.
//!
//! Uses seeded random resident/hospital instances with short preference
//! lists, similar to a residency intake.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use u_rankmatch::engine::RankMaximalSolver;
use u_rankmatch::evaluate::evaluate;
use u_rankmatch::instance::{normalize, Instance, NormalizeConfig, RawInstance};

// ===========================================================================
// Instance generator
// ===========================================================================

fn random_instance(residents: usize, hospitals: usize, list_len: usize, seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut raw = RawInstance::default();
    for h in 0..hospitals {
        raw = raw.with_hospital(h.to_string(), rng.random_range(1..=4));
    }

    let ids: Vec<String> = (0..hospitals).map(|h| h.to_string()).collect();
    for r in 0..residents {
        let len = rng.random_range(1..=list_len.min(hospitals));
        let prefs: Vec<&str> = ids
            .choose_multiple(&mut rng, len)
            .map(String::as_str)
            .collect();
        raw = raw.with_resident(format!("res{r}"), prefs.join(","));
    }

    normalize(&raw, &NormalizeConfig::default().with_id_pad_width(4))
        .unwrap_or_else(|e| panic!("generated instance is invalid: {e}"))
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_maximal_solve");
    group.sample_size(10);

    for &n in &[20, 60, 150] {
        let instance = random_instance(n, n / 3, 5, 42);
        let solver = RankMaximalSolver::new();
        group.bench_with_input(BenchmarkId::from_parameter(n), &instance, |b, inst| {
            b.iter(|| {
                let outcome = solver.solve(black_box(inst));
                black_box(outcome)
            })
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for &n in &[60, 150] {
        let instance = random_instance(n, n / 3, 5, 7);
        let outcome = RankMaximalSolver::new()
            .solve(&instance)
            .unwrap_or_else(|e| panic!("solve failed: {e}"));
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(instance, outcome),
            |b, (inst, out)| b.iter(|| black_box(evaluate(black_box(inst), &out.matching))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_solve, bench_evaluate);
criterion_main!(benches);
