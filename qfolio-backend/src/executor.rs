//! The circuit execution contract
//!
//! The optimization engine drives backends through exactly one operation:
//! bind angle values into an ansatz description and return measurement
//! counts. Everything else — state representation, transpilation, job
//! management — is the backend's concern.

use crate::error::{BackendError, Result};
use crate::result::ExecutionResult;
use qfolio_core::{IsingHamiltonian, PauliTerm};

/// Description of the QAOA circuit family executed by backends
///
/// The ansatz is `p` layers of (cost unitary, mixer unitary) applied to
/// the uniform superposition: the cost unitary is the diagonal phase
/// `exp(-i * gamma * H_C)` generated by the Ising terms, the mixer is a
/// global `RX(2 * beta)` rotation. Angle values `[g_1, b_1, ..., g_p, b_p]`
/// are bound at execution time, not stored here.
#[derive(Debug, Clone)]
pub struct AnsatzSpec {
    num_qubits: usize,
    depth: usize,
    terms: Vec<PauliTerm>,
}

impl AnsatzSpec {
    /// Build the ansatz for a cost Hamiltonian with `depth` layers
    pub fn for_hamiltonian(hamiltonian: &IsingHamiltonian, depth: usize) -> Self {
        Self {
            num_qubits: hamiltonian.num_qubits(),
            depth,
            terms: hamiltonian.terms().to_vec(),
        }
    }

    /// Number of qubits the circuit acts on
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of (cost, mixer) layers
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Cost Hamiltonian terms driving the phase separator
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Number of free angle values (two per layer)
    pub fn num_parameters(&self) -> usize {
        2 * self.depth
    }

    /// Validate an angle vector against this ansatz
    pub fn check_angles(&self, angles: &[f64]) -> Result<()> {
        if angles.len() != self.num_parameters() {
            return Err(BackendError::AngleCountMismatch {
                expected: self.num_parameters(),
                actual: angles.len(),
            });
        }
        Ok(())
    }
}

/// Trait for circuit execution backends
///
/// Implementations may compute locally or round-trip to remote hardware;
/// either way the caller sees counts or a typed error. Failures are never
/// retried here — the optimization loop treats them as fatal because an
/// interrupted convergence trace cannot be salvaged.
pub trait CircuitExecutor {
    /// Backend name, used in result metadata
    fn name(&self) -> &str;

    /// Execute the ansatz with concrete angle values
    ///
    /// # Arguments
    ///
    /// * `spec` - The ansatz to execute
    /// * `angles` - Angle values, `[gamma_1, beta_1, ..., gamma_p, beta_p]`
    /// * `shots` - Number of measurement shots
    fn execute(&self, spec: &AnsatzSpec, angles: &[f64], shots: usize) -> Result<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfolio_core::{build_qubo, MarketData};

    fn sample_spec(depth: usize) -> AnsatzSpec {
        let market = MarketData::new(
            vec![0.1, 0.2],
            vec![vec![0.04, 0.01], vec![0.01, 0.09]],
        )
        .unwrap();
        let qubo = build_qubo(&market, 0.5, None);
        AnsatzSpec::for_hamiltonian(&IsingHamiltonian::from_qubo(&qubo), depth)
    }

    #[test]
    fn test_parameter_count() {
        let spec = sample_spec(2);
        assert_eq!(spec.num_qubits(), 2);
        assert_eq!(spec.num_parameters(), 4);
    }

    #[test]
    fn test_angle_validation() {
        let spec = sample_spec(2);
        assert!(spec.check_angles(&[0.1, 0.2, 0.3, 0.4]).is_ok());
        assert!(matches!(
            spec.check_angles(&[0.1, 0.2]),
            Err(BackendError::AngleCountMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }
}
