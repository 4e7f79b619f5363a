//! Local shot sampler
//!
//! In-process realization of the execution contract for the QAOA circuit
//! family. Because the cost unitary is diagonal in the computational
//! basis and the mixer is a product of single-qubit RX rotations, the
//! statevector can be evolved directly: a per-basis-state phase for each
//! cost layer and a butterfly pass per qubit for each mixer layer. Shots
//! are then sampled from the final probability distribution.
//!
//! Memory is exponential in the qubit count, so the backend enforces a
//! configurable cap and rejects larger ansatzes with a typed error.

use crate::error::{BackendError, Result};
use crate::executor::{AnsatzSpec, CircuitExecutor};
use crate::result::{ExecutionMetadata, ExecutionResult, MeasurementCounts};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Instant;

/// Configuration for the local sampler backend
#[derive(Debug, Clone)]
pub struct LocalSamplerConfig {
    /// Deterministic seed for reproducible sampling
    pub seed: Option<u64>,

    /// Maximum number of qubits (dense statevector, 16 bytes per amplitude)
    pub max_qubits: usize,
}

impl Default for LocalSamplerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_qubits: 25,
        }
    }
}

/// Local statevector sampler for QAOA ansatzes
pub struct LocalSamplerBackend {
    name: String,
    config: LocalSamplerConfig,
}

impl Default for LocalSamplerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSamplerBackend {
    /// Create a sampler with default configuration
    pub fn new() -> Self {
        Self::with_config(LocalSamplerConfig::default())
    }

    /// Create a sampler with custom configuration
    pub fn with_config(config: LocalSamplerConfig) -> Self {
        Self {
            name: "LocalSampler".to_string(),
            config,
        }
    }

    /// Set a deterministic sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Per-basis-state cost energies, computed once per execution
    fn basis_energies(&self, spec: &AnsatzSpec) -> Result<Vec<f64>> {
        let dim = 1usize << spec.num_qubits();
        let mut energies = vec![0.0; dim];

        for term in spec.terms() {
            if !term.is_diagonal() {
                return Err(BackendError::AnsatzIncompatible(format!(
                    "Non-diagonal cost term {:?}; the sampler only executes Z/ZZ phase separators",
                    term.paulis()
                )));
            }
            let z_mask: usize = term.z_indices().map(|q| 1usize << q).sum();
            let coeff = term.coeff();
            for (idx, energy) in energies.iter_mut().enumerate() {
                let sign = if (idx & z_mask).count_ones() % 2 == 0 {
                    1.0
                } else {
                    -1.0
                };
                *energy += coeff * sign;
            }
        }

        Ok(energies)
    }

    /// Evolve the uniform superposition through all (cost, mixer) layers
    fn evolve(&self, spec: &AnsatzSpec, angles: &[f64]) -> Result<Vec<Complex64>> {
        let n = spec.num_qubits();
        let dim = 1usize << n;
        let energies = self.basis_energies(spec)?;

        let amp = 1.0 / (dim as f64).sqrt();
        let mut state = vec![Complex64::new(amp, 0.0); dim];

        for layer in 0..spec.depth() {
            let gamma = angles[2 * layer];
            let beta = angles[2 * layer + 1];

            // Cost unitary: diagonal phase exp(-i * gamma * E(z))
            for (idx, a) in state.iter_mut().enumerate() {
                *a *= Complex64::from_polar(1.0, -gamma * energies[idx]);
            }

            // Mixer: RX(2 * beta) on every qubit
            let (c, s) = (beta.cos(), beta.sin());
            let is = Complex64::new(0.0, -s);
            for q in 0..n {
                let bit = 1usize << q;
                for idx in 0..dim {
                    if idx & bit == 0 {
                        let a0 = state[idx];
                        let a1 = state[idx | bit];
                        state[idx] = c * a0 + is * a1;
                        state[idx | bit] = is * a0 + c * a1;
                    }
                }
            }
        }

        Ok(state)
    }

    /// Probability distribution over observed basis states
    fn compute_probabilities(&self, state: &[Complex64], num_qubits: usize) -> Vec<(String, f64)> {
        let mut probs = Vec::new();
        for (idx, amp) in state.iter().enumerate() {
            let prob = amp.norm_sqr();
            if prob > 1e-12 {
                // First character = highest-index qubit
                let bitstring = format!("{:0width$b}", idx, width = num_qubits);
                probs.push((bitstring, prob));
            }
        }
        probs
    }

    /// Draw one bitstring from the distribution
    fn sample_once<R: Rng>(&self, probabilities: &[(String, f64)], rng: &mut R) -> String {
        let mut cumulative = 0.0;
        let random_value: f64 = rng.gen();

        for (bitstring, prob) in probabilities {
            cumulative += prob;
            if random_value <= cumulative {
                return bitstring.clone();
            }
        }

        // Rounding residue in the cumulative sum lands on the last outcome
        probabilities
            .last()
            .map(|(bs, _)| bs.clone())
            .unwrap_or_default()
    }
}

impl CircuitExecutor for LocalSamplerBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, spec: &AnsatzSpec, angles: &[f64], shots: usize) -> Result<ExecutionResult> {
        spec.check_angles(angles)?;
        if spec.num_qubits() > self.config.max_qubits {
            return Err(BackendError::TooManyQubits {
                requested: spec.num_qubits(),
                limit: self.config.max_qubits,
            });
        }

        let start = Instant::now();
        let state = self.evolve(spec, angles)?;
        let probabilities = self.compute_probabilities(&state, spec.num_qubits());

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..shots {
            let sample = self.sample_once(&probabilities, &mut rng);
            *counts.entry(sample).or_insert(0) += 1;
        }

        Ok(ExecutionResult {
            counts: MeasurementCounts::from_counts(counts),
            metadata: ExecutionMetadata::completed(self.name.clone(), shots, start.elapsed()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qfolio_core::{build_qubo, IsingHamiltonian, MarketData, PauliTerm};
    use std::f64::consts::FRAC_PI_4;

    fn two_asset_spec(depth: usize) -> AnsatzSpec {
        let market = MarketData::new(
            vec![0.1, 0.2],
            vec![vec![0.04, 0.01], vec![0.01, 0.09]],
        )
        .unwrap();
        let qubo = build_qubo(&market, 0.5, None);
        AnsatzSpec::for_hamiltonian(&IsingHamiltonian::from_qubo(&qubo), depth)
    }

    #[test]
    fn test_zero_angles_keep_uniform_distribution() {
        // gamma = 0 applies no phase and beta = 0 applies no mixing, so
        // every bitstring stays equally likely.
        let backend = LocalSamplerBackend::new().with_seed(7);
        let spec = two_asset_spec(1);
        let result = backend.execute(&spec, &[0.0, 0.0], 4096).unwrap();

        assert_eq!(result.counts.total_shots(), 4096);
        assert_eq!(result.counts.num_outcomes(), 4);
        for bs in ["00", "01", "10", "11"] {
            assert_abs_diff_eq!(result.counts.probability(bs), 0.25, epsilon = 0.05);
        }
    }

    #[test]
    fn test_cost_phase_alone_preserves_probabilities() {
        // The phase separator is diagonal; without mixing it cannot move
        // probability mass.
        let backend = LocalSamplerBackend::new().with_seed(7);
        let spec = two_asset_spec(1);
        let result = backend.execute(&spec, &[1.3, 0.0], 4096).unwrap();

        for bs in ["00", "01", "10", "11"] {
            assert_abs_diff_eq!(result.counts.probability(bs), 0.25, epsilon = 0.05);
        }
    }

    #[test]
    fn test_single_qubit_ground_state_concentration() {
        // For H = Z the final P(|0>) is (1 + sin(2*beta) * sin(2*gamma)) / 2,
        // so gamma = -pi/4, beta = pi/4 puts all mass on the ground state |1>.
        let hamiltonian_terms = vec![PauliTerm::z_product(1, &[0], 1.0)];
        let spec = AnsatzSpec::for_hamiltonian(
            &test_hamiltonian(1, hamiltonian_terms),
            1,
        );

        let backend = LocalSamplerBackend::new().with_seed(11);
        let result = backend
            .execute(&spec, &[-FRAC_PI_4, FRAC_PI_4], 512)
            .unwrap();

        assert_eq!(result.counts.get("1"), 512);
        assert_eq!(result.counts.get("0"), 0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let spec = two_asset_spec(2);
        let angles = [0.4, 0.3, 0.2, 0.6];

        let a = LocalSamplerBackend::new()
            .with_seed(42)
            .execute(&spec, &angles, 1024)
            .unwrap();
        let b = LocalSamplerBackend::new()
            .with_seed(42)
            .execute(&spec, &angles, 1024)
            .unwrap();

        assert_eq!(a.counts, b.counts);
    }

    #[test]
    fn test_qubit_cap_enforced() {
        let backend = LocalSamplerBackend::with_config(LocalSamplerConfig {
            seed: Some(1),
            max_qubits: 1,
        });
        let spec = two_asset_spec(1);
        assert!(matches!(
            backend.execute(&spec, &[0.0, 0.0], 16),
            Err(BackendError::TooManyQubits {
                requested: 2,
                limit: 1
            })
        ));
    }

    #[test]
    fn test_angle_count_checked() {
        let backend = LocalSamplerBackend::new();
        let spec = two_asset_spec(2);
        assert!(matches!(
            backend.execute(&spec, &[0.0, 0.0], 16),
            Err(BackendError::AngleCountMismatch { .. })
        ));
    }

    // Builds a Hamiltonian directly from terms for targeted tests.
    fn test_hamiltonian(num_qubits: usize, terms: Vec<PauliTerm>) -> IsingHamiltonian {
        IsingHamiltonian::from_parts(num_qubits, terms, 0.0)
    }
}
