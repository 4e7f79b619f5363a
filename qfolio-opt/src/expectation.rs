//! Shot-based expectation estimation
//!
//! Computes the energy expectation of the cost Hamiltonian from
//! empirical measurement counts without ever materializing the full
//! operator: each observed bitstring is scored directly against the
//! Pauli terms and weighted by its empirical probability.
//!
//! This is a Monte Carlo estimator; the statistical error scales with
//! `1 / sqrt(shots)`.

use qfolio_backend::MeasurementCounts;
use qfolio_core::{IsingHamiltonian, Pauli};

/// Estimate `<H>` from measurement counts
///
/// Bitstrings follow the device convention: the first character belongs
/// to the highest-index qubit, so bits are reversed before indexing.
/// Each bit maps to a Z eigenvalue (0 -> +1, 1 -> -1). Terms containing
/// anything but identity or Z have no basis-state eigenvalue and are
/// forced to contribute zero; the Ising encoder never emits them, so the
/// guard only matters for hand-built Hamiltonians.
pub fn expectation_from_counts(counts: &MeasurementCounts, hamiltonian: &IsingHamiltonian) -> f64 {
    let total = counts.total_shots();
    if total == 0 {
        return 0.0;
    }

    let mut expectation = 0.0;
    for (bitstring, count) in counts.iter() {
        // Reverse into natural order: position i = qubit i
        let eigen: Vec<f64> = bitstring
            .chars()
            .rev()
            .map(|c| if c == '1' { -1.0 } else { 1.0 })
            .collect();

        let energy = bitstring_energy(&eigen, hamiltonian);
        expectation += energy * count as f64 / total as f64;
    }

    expectation
}

/// Energy of one bitstring, given its per-qubit Z eigenvalues
fn bitstring_energy(eigen: &[f64], hamiltonian: &IsingHamiltonian) -> f64 {
    let mut energy = 0.0;

    'terms: for term in hamiltonian.terms() {
        let mut value = term.coeff();
        for (qubit, &pauli) in term.paulis().iter().enumerate() {
            match pauli {
                Pauli::I => {},
                Pauli::Z => {
                    if qubit < eigen.len() {
                        value *= eigen[qubit];
                    } else {
                        // Z on a qubit the bitstring does not cover
                        continue 'terms;
                    }
                },
                // X and Y never appear in an Ising Hamiltonian
                _ => continue 'terms,
            }
        }
        energy += value;
    }

    energy
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qfolio_core::{build_qubo, MarketData, PauliTerm};
    use std::collections::HashMap;

    fn counts_of(pairs: &[(&str, usize)]) -> MeasurementCounts {
        let map: HashMap<String, usize> =
            pairs.iter().map(|(bs, c)| (bs.to_string(), *c)).collect();
        MeasurementCounts::from_counts(map)
    }

    #[test]
    fn test_single_z_term() {
        // <Z> over {"0": 80, "1": 20} is 0.8 - 0.2 = 0.6 exactly.
        let h = IsingHamiltonian::from_parts(1, vec![PauliTerm::z_product(1, &[0], 1.0)], 0.0);
        let counts = counts_of(&[("0", 80), ("1", 20)]);

        assert_relative_eq!(expectation_from_counts(&counts, &h), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_zz_term_with_bit_reversal() {
        // "10" reads as qubit 1 = 1, qubit 0 = 0. A ZZ term flips sign on
        // odd parity, so this state scores -1.
        let h = IsingHamiltonian::from_parts(2, vec![PauliTerm::z_product(2, &[0, 1], 1.0)], 0.0);

        let aligned = counts_of(&[("00", 1)]);
        let anti = counts_of(&[("10", 1)]);

        assert_relative_eq!(expectation_from_counts(&aligned, &h), 1.0, epsilon = 1e-12);
        assert_relative_eq!(expectation_from_counts(&anti, &h), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_diagonal_terms_ignored() {
        use qfolio_core::Pauli;
        let h = IsingHamiltonian::from_parts(
            1,
            vec![
                PauliTerm::from_paulis(vec![Pauli::X], 100.0),
                PauliTerm::z_product(1, &[0], 1.0),
            ],
            0.0,
        );
        let counts = counts_of(&[("0", 1)]);

        // Only the Z term contributes
        assert_relative_eq!(expectation_from_counts(&counts, &h), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_short_bitstring_drops_uncovered_terms() {
        let h = IsingHamiltonian::from_parts(2, vec![PauliTerm::z_product(2, &[1], 2.0)], 0.0);
        // One-bit string covers only qubit 0; the Z on qubit 1 cannot be
        // evaluated and its term contributes zero.
        let counts = counts_of(&[("0", 1)]);
        assert_relative_eq!(expectation_from_counts(&counts, &h), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_counts() {
        let h = IsingHamiltonian::from_parts(1, vec![PauliTerm::z_product(1, &[0], 1.0)], 0.0);
        assert_eq!(expectation_from_counts(&MeasurementCounts::empty(), &h), 0.0);
    }

    #[test]
    fn test_round_trip_against_qubo() {
        // Encoder followed by estimator reproduces the QUBO objective on
        // pure basis states, up to the known offset.
        let market = MarketData::new(
            vec![0.1, 0.2],
            vec![vec![0.04, 0.01], vec![0.01, 0.09]],
        )
        .unwrap();
        let qubo = build_qubo(&market, 0.7, None);
        let h = IsingHamiltonian::from_qubo(&qubo);

        let all_zero = counts_of(&[("00", 17)]);
        assert_relative_eq!(
            expectation_from_counts(&all_zero, &h) + h.offset(),
            qubo.evaluate(&[0, 0]),
            epsilon = 1e-10
        );

        let all_one = counts_of(&[("11", 3)]);
        assert_relative_eq!(
            expectation_from_counts(&all_one, &h) + h.offset(),
            qubo.evaluate(&[1, 1]),
            epsilon = 1e-10
        );
    }
}
