//! Ising encoding of the QUBO objective
//!
//! Substituting `x_i = (1 - z_i) / 2` into `x^T Q x` rewrites the binary
//! objective as a weighted sum of Pauli Z and ZZ products plus a scalar
//! offset. The transform is pure arithmetic and exactly reproducible:
//! callers that only compare energies may discard the offset.
//!
//! Because the source problem is purely quadratic-binary, only identity
//! and Z operators ever appear in the encoded Hamiltonian.

use crate::qubo::QuboMatrix;
use std::fmt;

/// Coefficients below this magnitude are dropped during encoding.
const COEFF_EPSILON: f64 = 1e-12;

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity operator
    I,
    /// Pauli X (bit flip)
    X,
    /// Pauli Y
    Y,
    /// Pauli Z (phase flip)
    Z,
}

impl Pauli {
    /// Check if this Pauli is diagonal in the computational basis (I or Z)
    pub fn is_diagonal(self) -> bool {
        matches!(self, Pauli::I | Pauli::Z)
    }

    /// Eigenvalue for a computational basis state, diagonal operators only
    ///
    /// `|0>` maps to +1 and `|1>` to -1 under Z; identity is always +1.
    pub fn eigenvalue(self, bit_set: bool) -> f64 {
        match self {
            Pauli::I => 1.0,
            Pauli::Z => {
                if bit_set {
                    -1.0
                } else {
                    1.0
                }
            },
            _ => 0.0,
        }
    }

    /// Character representation
    pub fn to_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// One weighted Pauli product acting on a register
///
/// The operator list is index-aligned with the qubit register: position
/// `i` holds the operator applied to qubit `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PauliTerm {
    paulis: Vec<Pauli>,
    coeff: f64,
}

impl PauliTerm {
    /// Create a term with Z operators at the given qubit indices
    pub fn z_product(num_qubits: usize, z_indices: &[usize], coeff: f64) -> Self {
        let mut paulis = vec![Pauli::I; num_qubits];
        for &q in z_indices {
            paulis[q] = Pauli::Z;
        }
        Self { paulis, coeff }
    }

    /// Create a term from an explicit operator list
    pub fn from_paulis(paulis: Vec<Pauli>, coeff: f64) -> Self {
        Self { paulis, coeff }
    }

    /// Term coefficient
    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    /// Operator applied to each qubit
    pub fn paulis(&self) -> &[Pauli] {
        &self.paulis
    }

    /// Qubit indices carrying a Z operator
    pub fn z_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Pauli::Z)
            .map(|(i, _)| i)
    }

    /// Check if every operator in the term is diagonal (I or Z)
    pub fn is_diagonal(&self) -> bool {
        self.paulis.iter().all(|p| p.is_diagonal())
    }

    /// Eigenvalue of this term for a basis state in natural bit order
    ///
    /// `bits[i]` is the value of qubit `i`; indices beyond `bits.len()`
    /// read as 0. Returns `None` for non-diagonal terms, which have no
    /// basis-state eigenvalue.
    pub fn diagonal_eigenvalue(&self, bits: &[u8]) -> Option<f64> {
        if !self.is_diagonal() {
            return None;
        }
        let mut value = self.coeff;
        for i in self.z_indices() {
            let set = bits.get(i).copied().unwrap_or(0) == 1;
            value *= Pauli::Z.eigenvalue(set);
        }
        Some(value)
    }
}

/// Weighted sum of Pauli Z / ZZ terms with a scalar offset
///
/// Derived once from a QUBO matrix and immutable afterwards. The energy
/// of a basis state plus the offset reproduces the QUBO objective value
/// of the corresponding binary vector exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct IsingHamiltonian {
    num_qubits: usize,
    terms: Vec<PauliTerm>,
    offset: f64,
}

impl IsingHamiltonian {
    /// Encode a QUBO matrix as an Ising cost Hamiltonian
    ///
    /// Diagonal entries contribute a constant and a single-qubit Z term;
    /// symmetrized off-diagonal pairs `Q[i,j] + Q[j,i]` contribute a
    /// two-qubit ZZ term. Near-zero coefficients are dropped.
    pub fn from_qubo(q: &QuboMatrix) -> Self {
        let n = q.dim();
        let mut linear = vec![0.0; n];
        let mut offset = 0.0;
        let mut terms = Vec::new();

        for i in 0..n {
            // x_i = (1 - z_i) / 2 turns Q_ii x_i into Q_ii/2 - (Q_ii/2) z_i
            linear[i] -= q[(i, i)] / 2.0;
            offset += q[(i, i)] / 2.0;

            for j in (i + 1)..n {
                let pair = q[(i, j)] + q[(j, i)];
                if pair.abs() <= COEFF_EPSILON {
                    continue;
                }
                // x_i x_j = (1 - z_i - z_j + z_i z_j) / 4
                offset += pair / 4.0;
                linear[i] -= pair / 4.0;
                linear[j] -= pair / 4.0;
                terms.push(PauliTerm::z_product(n, &[i, j], pair / 4.0));
            }
        }

        for (i, &coeff) in linear.iter().enumerate() {
            if coeff.abs() > COEFF_EPSILON {
                terms.push(PauliTerm::z_product(n, &[i], coeff));
            }
        }

        Self {
            num_qubits: n,
            terms,
            offset,
        }
    }

    /// Assemble a Hamiltonian from explicit terms
    pub fn from_parts(num_qubits: usize, terms: Vec<PauliTerm>, offset: f64) -> Self {
        Self {
            num_qubits,
            terms,
            offset,
        }
    }

    /// Number of qubits the Hamiltonian acts on
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Weighted Pauli terms (offset excluded)
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Scalar offset collected during encoding
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Energy of a basis state in natural bit order, offset excluded
    pub fn energy(&self, bits: &[u8]) -> f64 {
        self.terms
            .iter()
            .map(|t| t.diagonal_eigenvalue(bits).unwrap_or(0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketData;
    use crate::qubo::build_qubo;
    use approx::assert_relative_eq;

    fn sample_qubo() -> QuboMatrix {
        let market = MarketData::new(
            vec![0.1, 0.2, 0.15],
            vec![
                vec![0.04, 0.01, 0.02],
                vec![0.01, 0.09, 0.03],
                vec![0.02, 0.03, 0.05],
            ],
        )
        .unwrap();
        build_qubo(&market, 0.5, None)
    }

    #[test]
    fn test_only_diagonal_operators() {
        let h = IsingHamiltonian::from_qubo(&sample_qubo());
        assert!(h.terms().iter().all(|t| t.is_diagonal()));
    }

    #[test]
    fn test_energy_reproduces_qubo_objective() {
        // The encoding is loss-free: energy + offset == x^T Q x for every
        // binary vector.
        let q = sample_qubo();
        let h = IsingHamiltonian::from_qubo(&q);

        for mask in 0..(1u32 << 3) {
            let bits: Vec<u8> = (0..3).map(|i| ((mask >> i) & 1) as u8).collect();
            assert_relative_eq!(
                h.energy(&bits) + h.offset(),
                q.evaluate(&bits),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_non_diagonal_term_has_no_eigenvalue() {
        let term = PauliTerm::from_paulis(vec![Pauli::X, Pauli::Z], 1.0);
        assert_eq!(term.diagonal_eigenvalue(&[0, 0]), None);
    }

    #[test]
    fn test_z_eigenvalues() {
        let term = PauliTerm::z_product(2, &[0], 1.0);
        assert_eq!(term.diagonal_eigenvalue(&[0, 0]), Some(1.0));
        assert_eq!(term.diagonal_eigenvalue(&[1, 0]), Some(-1.0));
        // Bits beyond the slice read as 0
        assert_eq!(term.diagonal_eigenvalue(&[]), Some(1.0));
    }
}
