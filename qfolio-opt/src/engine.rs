//! The variational optimization loop
//!
//! Drives a QAOA ansatz toward low-energy bitstrings: encode the
//! portfolio QUBO as an Ising Hamiltonian, search the 2p circuit angles
//! with the derivative-free simplex method, and sample the final
//! distribution at the full shot budget. The best observed bitstring is
//! then re-scored classically, repaired into the cardinality range, and
//! reweighted through the mean-variance solver.
//!
//! Every objective evaluation goes through an explicit accumulator
//! ([`EnergyObjective`]) that records the convergence trace; nothing is
//! shared through captured mutable state.

use crate::classical::MeanVarianceConfig;
use crate::error::{OptimizeError, Result};
use crate::expectation::expectation_from_counts;
use crate::hybrid::reweight_with;
use crate::repair::repair_cardinality;
use crate::search::{minimize, NelderMeadConfig, Objective, SearchOutcome};
use qfolio_backend::{AnsatzSpec, CircuitExecutor, MeasurementCounts};
use qfolio_core::{build_qubo, Allocation, IsingHamiltonian, MarketData, QuboMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Floor on the objective-evaluation budget
const MIN_EVALUATIONS: usize = 50;

/// Base evaluation budget, shrunk as the asset count grows
const BASE_EVALUATIONS: usize = 200;

/// Floor on the per-evaluation shot count during the search phase
const MIN_SEARCH_SHOTS: usize = 128;

/// Configuration for one hybrid optimization request
#[derive(Debug, Clone)]
pub struct QaoaConfig {
    /// Number of (cost, mixer) ansatz layers
    pub depth: usize,

    /// Total shot budget; the final evaluation always uses all of it
    pub shots: usize,

    /// Optional cardinality bounds (min, max) on the selection count
    pub cardinality: Option<(usize, usize)>,

    /// Seed for angle initialization and solver randomness
    pub seed: Option<u64>,

    /// Settings for the reweighting solver
    pub solver: MeanVarianceConfig,
}

impl Default for QaoaConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            shots: 1024,
            cardinality: None,
            seed: None,
            solver: MeanVarianceConfig::default(),
        }
    }
}

impl QaoaConfig {
    /// Set the ansatz depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the total shot budget
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    /// Bound the selection count
    pub fn with_cardinality(mut self, min_assets: usize, max_assets: usize) -> Self {
        self.cardinality = Some((min_assets, max_assets));
        self
    }

    /// Fix all randomness for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.solver.seed = Some(seed);
        self
    }
}

/// Result of one hybrid optimization request
#[derive(Debug, Clone)]
pub struct QaoaOutcome {
    /// Final binary selection, after cardinality repair
    pub allocation: Allocation,

    /// Continuous weights produced by hybrid reweighting
    pub weights: Vec<f64>,

    /// Authoritative measurement distribution from the final high-shot
    /// evaluation
    pub counts: MeasurementCounts,

    /// Lowest-objective bitstring observed, device bit order
    pub best_bitstring: String,

    /// Best angle values found by the search
    pub best_angles: Vec<f64>,

    /// Name of the backend that executed the circuits
    pub backend_name: String,

    convergence: Vec<f64>,
}

impl QaoaOutcome {
    /// Objective value recorded at every search evaluation, in call order
    pub fn convergence(&self) -> &[f64] {
        &self.convergence
    }
}

/// Objective-evaluation budget for a given asset count
///
/// Larger circuits make every evaluation proportionally more expensive,
/// so the budget shrinks with n down to a fixed floor.
pub fn evaluation_budget(num_assets: usize) -> usize {
    BASE_EVALUATIONS
        .saturating_sub(3 * num_assets)
        .max(MIN_EVALUATIONS)
}

/// Per-evaluation shot count during the search phase
///
/// Trades estimator noise for loop speed; the final evaluation always
/// runs the full budget.
pub fn search_shots(total_shots: usize, num_assets: usize) -> usize {
    let scaled = total_shots / (num_assets / 10).max(1);
    scaled.max(MIN_SEARCH_SHOTS).min(total_shots)
}

/// The search objective: energy expectation at candidate angles
///
/// Owns the convergence trace. Every evaluation executes the ansatz,
/// estimates `<H>` from the counts, appends the value to the trace, and
/// hands it to the search. Executor failures propagate unmodified — the
/// trace cannot be meaningfully continued past a failed execution.
pub struct EnergyObjective<'a, E: CircuitExecutor + ?Sized> {
    executor: &'a E,
    spec: &'a AnsatzSpec,
    hamiltonian: &'a IsingHamiltonian,
    shots: usize,
    trace: Vec<f64>,
}

impl<'a, E: CircuitExecutor + ?Sized> EnergyObjective<'a, E> {
    /// Create an objective evaluating `spec` at `shots` per call
    pub fn new(
        executor: &'a E,
        spec: &'a AnsatzSpec,
        hamiltonian: &'a IsingHamiltonian,
        shots: usize,
    ) -> Self {
        Self {
            executor,
            spec,
            hamiltonian,
            shots,
            trace: Vec::new(),
        }
    }

    /// Values recorded so far
    pub fn trace(&self) -> &[f64] {
        &self.trace
    }

    /// Consume the objective, releasing the trace
    pub fn into_trace(self) -> Vec<f64> {
        self.trace
    }
}

impl<E: CircuitExecutor + ?Sized> Objective for EnergyObjective<'_, E> {
    fn evaluate(&mut self, angles: &[f64]) -> Result<f64> {
        let result = self.executor.execute(self.spec, angles, self.shots)?;
        let energy = expectation_from_counts(&result.counts, self.hamiltonian);
        self.trace.push(energy);
        Ok(energy)
    }
}

/// Run the full hybrid optimization pipeline
///
/// QUBO construction, Ising encoding, angle search, final sampling,
/// best-bitstring extraction, cardinality repair, and hybrid
/// reweighting, in that order. The classical comparator is a separate
/// call to [`crate::classical::solve_mean_variance`].
pub fn run_qaoa<E: CircuitExecutor + ?Sized>(
    market: &MarketData,
    risk_tolerance: f64,
    executor: &E,
    config: &QaoaConfig,
) -> Result<QaoaOutcome> {
    if config.depth == 0 {
        return Err(OptimizeError::InvalidProblem(
            "Ansatz depth must be at least 1".to_string(),
        ));
    }
    let n = market.num_assets();

    let qubo = build_qubo(market, risk_tolerance, config.cardinality);
    let hamiltonian = IsingHamiltonian::from_qubo(&qubo);
    let spec = AnsatzSpec::for_hamiltonian(&hamiltonian, config.depth);

    let budget = evaluation_budget(n);
    let inner_shots = search_shots(config.shots, n);

    // Random initialization, uniform over [-pi, pi] for every angle
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let initial: Vec<f64> = (0..spec.num_parameters())
        .map(|_| rng.gen_range(-PI..PI))
        .collect();

    let mut objective = EnergyObjective::new(executor, &spec, &hamiltonian, inner_shots);
    let SearchOutcome {
        best_point: best_angles,
        ..
    } = minimize(
        &mut objective,
        &initial,
        &NelderMeadConfig::with_budget(budget),
    )?;
    let convergence = objective.into_trace();

    // One clean high-shot sample at the best angles; these counts are
    // the authoritative distribution
    let final_result = executor.execute(&spec, &best_angles, config.shots)?;
    let counts = final_result.counts;
    let backend_name = final_result
        .metadata
        .backend_name
        .unwrap_or_else(|| executor.name().to_string());

    let best = best_bitstring(&counts, &qubo, n);
    let mut allocation = allocation_from_bitstring(&best, n);

    repair_cardinality(&mut allocation, market.mean_returns(), config.cardinality);
    let weights = reweight_with(&allocation, market, risk_tolerance, &config.solver);

    Ok(QaoaOutcome {
        allocation,
        weights,
        counts,
        best_bitstring: best,
        best_angles,
        backend_name,
        convergence,
    })
}

/// Pick the lowest-objective bitstring from a measurement distribution
///
/// The most frequently sampled state is not guaranteed to be the lowest
/// energy one, especially at low shot counts, so every distinct observed
/// bitstring is re-scored classically against the QUBO. Iteration is in
/// sorted key order so ties resolve deterministically; empty counts give
/// the all-zero string.
pub fn best_bitstring(counts: &MeasurementCounts, qubo: &QuboMatrix, n: usize) -> String {
    let mut keys: Vec<&String> = counts.bitstrings().collect();
    keys.sort();

    let mut best: Option<&String> = None;
    let mut best_value = f64::INFINITY;

    for bitstring in keys {
        let bits = natural_bits(bitstring, n);
        let value = qubo.evaluate(&bits);
        if value < best_value {
            best_value = value;
            best = Some(bitstring);
        }
    }

    match best {
        Some(bitstring) => bitstring.clone(),
        None => "0".repeat(n),
    }
}

/// Binary allocation from a device-order bitstring
fn allocation_from_bitstring(bitstring: &str, n: usize) -> Allocation {
    Allocation::from_bits(natural_bits(bitstring, n))
}

/// Reverse a device-order bitstring into natural order, padded or
/// truncated to exactly `n` bits
fn natural_bits(bitstring: &str, n: usize) -> Vec<u8> {
    let mut bits: Vec<u8> = bitstring
        .chars()
        .rev()
        .map(|c| if c == '1' { 1 } else { 0 })
        .collect();
    bits.resize(n, 0);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qfolio_backend::{
        BackendError, ExecutionMetadata, ExecutionResult, LocalSamplerBackend,
    };
    use std::collections::HashMap;

    fn counts_of(pairs: &[(&str, usize)]) -> MeasurementCounts {
        let map: HashMap<String, usize> =
            pairs.iter().map(|(bs, c)| (bs.to_string(), *c)).collect();
        MeasurementCounts::from_counts(map)
    }

    fn identity_qubo() -> QuboMatrix {
        // Identity covariance with lambda = 0 yields Q = I exactly
        let market = MarketData::new(
            vec![0.1, 0.2],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        build_qubo(&market, 0.0, None)
    }

    #[test]
    fn test_evaluation_budget_policy() {
        assert_eq!(evaluation_budget(2), 194);
        assert_eq!(evaluation_budget(10), 170);
        assert_eq!(evaluation_budget(50), 50);
        assert_eq!(evaluation_budget(100), 50);
    }

    #[test]
    fn test_search_shots_policy() {
        // Small portfolios search at the full budget
        assert_eq!(search_shots(1024, 4), 1024);
        // Large portfolios scale shots down, floored at 128
        assert_eq!(search_shots(1024, 20), 512);
        assert_eq!(search_shots(1024, 100), 128);
        // The floor never exceeds the requested total
        assert_eq!(search_shots(64, 100), 64);
    }

    #[test]
    fn test_best_bitstring_rescored_not_most_frequent() {
        // "01" is sampled most, but "00" has the lower objective value
        let counts = counts_of(&[("00", 5), ("01", 3), ("11", 2)]);
        let best = best_bitstring(&counts, &identity_qubo(), 2);
        assert_eq!(best, "00");
    }

    #[test]
    fn test_best_bitstring_empty_counts() {
        let counts = MeasurementCounts::empty();
        assert_eq!(best_bitstring(&counts, &identity_qubo(), 2), "00");
    }

    #[test]
    fn test_bitstring_reversal_into_allocation() {
        // Device order "01" means qubit 0 = 1, qubit 1 = 0
        let allocation = allocation_from_bitstring("01", 2);
        assert_eq!(allocation.bits(), &[1, 0]);

        // Short strings pad with zeros at high indices
        let padded = allocation_from_bitstring("1", 3);
        assert_eq!(padded.bits(), &[1, 0, 0]);

        // Long strings truncate to n
        let truncated = allocation_from_bitstring("111", 2);
        assert_eq!(truncated.bits(), &[1, 1]);
    }

    #[test]
    fn test_run_qaoa_end_to_end() {
        let market = MarketData::new(
            vec![0.08, 0.12, 0.15],
            vec![
                vec![0.04, 0.006, 0.012],
                vec![0.006, 0.09, 0.018],
                vec![0.012, 0.018, 0.16],
            ],
        )
        .unwrap();

        let backend = LocalSamplerBackend::new().with_seed(17);
        let config = QaoaConfig::default()
            .with_depth(1)
            .with_shots(512)
            .with_seed(17);

        let outcome = run_qaoa(&market, 0.5, &backend, &config).unwrap();

        assert_eq!(outcome.allocation.len(), 3);
        assert_eq!(outcome.best_bitstring.len(), 3);
        assert_eq!(outcome.counts.total_shots(), 512);
        assert_eq!(outcome.backend_name, "LocalSampler");

        // Weights live on the simplex
        let total: f64 = outcome.weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        for &w in &outcome.weights {
            assert!((0.0..=1.0 + 1e-9).contains(&w));
        }

        // The trace holds one value per search evaluation
        assert!(!outcome.convergence().is_empty());
        assert!(outcome.convergence().len() <= evaluation_budget(3));
        assert_eq!(outcome.best_angles.len(), 2);
    }

    #[test]
    fn test_run_qaoa_respects_cardinality() {
        let market = MarketData::new(
            vec![0.08, 0.12, 0.15, 0.1],
            vec![
                vec![0.04, 0.006, 0.012, 0.002],
                vec![0.006, 0.09, 0.018, 0.004],
                vec![0.012, 0.018, 0.16, 0.006],
                vec![0.002, 0.004, 0.006, 0.05],
            ],
        )
        .unwrap();

        let backend = LocalSamplerBackend::new().with_seed(23);
        let config = QaoaConfig::default()
            .with_depth(1)
            .with_shots(256)
            .with_cardinality(1, 2)
            .with_seed(23);

        let outcome = run_qaoa(&market, 0.5, &backend, &config).unwrap();
        let count = outcome.allocation.selected_count();
        assert!((1..=2).contains(&count), "selected {} assets", count);
    }

    #[test]
    fn test_executor_failure_is_fatal() {
        struct BrokenBackend;

        impl CircuitExecutor for BrokenBackend {
            fn name(&self) -> &str {
                "broken"
            }

            fn execute(
                &self,
                _spec: &AnsatzSpec,
                _angles: &[f64],
                _shots: usize,
            ) -> qfolio_backend::Result<ExecutionResult> {
                Err(BackendError::NetworkError("device unreachable".to_string()))
            }
        }

        let market = MarketData::new(
            vec![0.1, 0.2],
            vec![vec![0.04, 0.01], vec![0.01, 0.09]],
        )
        .unwrap();

        let result = run_qaoa(&market, 0.5, &BrokenBackend, &QaoaConfig::default());
        assert!(matches!(result, Err(OptimizeError::Execution(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let market = MarketData::new(vec![0.1], vec![vec![0.04]]).unwrap();
        let backend = LocalSamplerBackend::new();
        let config = QaoaConfig::default().with_depth(0);

        assert!(matches!(
            run_qaoa(&market, 0.5, &backend, &config),
            Err(OptimizeError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_metadata_suppressed_name_falls_back_to_executor() {
        // An executor that strips metadata still yields a named outcome
        struct Anonymous(LocalSamplerBackend);

        impl CircuitExecutor for Anonymous {
            fn name(&self) -> &str {
                "anonymous"
            }

            fn execute(
                &self,
                spec: &AnsatzSpec,
                angles: &[f64],
                shots: usize,
            ) -> qfolio_backend::Result<ExecutionResult> {
                let mut result = self.0.execute(spec, angles, shots)?;
                result.metadata = ExecutionMetadata::default();
                Ok(result)
            }
        }

        let market = MarketData::new(vec![0.1], vec![vec![0.04]]).unwrap();
        let backend = Anonymous(LocalSamplerBackend::new().with_seed(3));
        let config = QaoaConfig::default().with_depth(1).with_shots(128).with_seed(3);

        let outcome = run_qaoa(&market, 0.5, &backend, &config).unwrap();
        assert_eq!(outcome.backend_name, "anonymous");
    }
}
