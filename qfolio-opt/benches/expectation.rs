//! Benchmark for the shot-based expectation estimator

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qfolio_backend::MeasurementCounts;
use qfolio_core::{build_qubo, IsingHamiltonian, MarketData};
use qfolio_opt::expectation_from_counts;
use std::collections::HashMap;

fn dense_problem(n: usize) -> IsingHamiltonian {
    let returns: Vec<f64> = (0..n).map(|i| 0.05 + 0.01 * i as f64).collect();
    let covariance: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.04 + 0.005 * i as f64 } else { 0.002 })
                .collect()
        })
        .collect();
    let market = MarketData::new(returns, covariance).unwrap();
    IsingHamiltonian::from_qubo(&build_qubo(&market, 0.5, Some((2, n / 2))))
}

fn synthetic_counts(n: usize, outcomes: usize) -> MeasurementCounts {
    let mut counts = HashMap::new();
    for k in 0..outcomes {
        // Spread distinct bitstrings across the basis
        let idx = (k * 2654435761) % (1 << n);
        let bitstring = format!("{:0width$b}", idx, width = n);
        counts.insert(bitstring, 1 + k % 17);
    }
    MeasurementCounts::from_counts(counts)
}

fn bench_expectation(c: &mut Criterion) {
    for &n in &[8, 16] {
        let hamiltonian = dense_problem(n);
        let counts = synthetic_counts(n, 256);

        c.bench_function(&format!("expectation_{}_assets", n), |b| {
            b.iter(|| expectation_from_counts(black_box(&counts), black_box(&hamiltonian)))
        });
    }
}

criterion_group!(benches, bench_expectation);
criterion_main!(benches);
