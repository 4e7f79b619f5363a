//! Market input data
//!
//! Annualized per-asset statistics consumed by both the QUBO builder and
//! the classical mean-variance solver. All vectors and matrix axes are
//! index-aligned: position `i` always refers to the same asset.

use crate::error::{CoreError, Result};

/// Annualized expected returns and covariance for an asset universe
///
/// The covariance matrix is assumed symmetric and positive-semidefinite;
/// this is an input invariant of the upstream data pipeline and is not
/// enforced here. Shapes are checked at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    mean_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
}

impl MarketData {
    /// Create market data, validating shapes
    ///
    /// # Errors
    ///
    /// Returns an error if the universe is empty, the covariance matrix
    /// row count disagrees with the return vector length, or any row is
    /// ragged.
    pub fn new(mean_returns: Vec<f64>, covariance: Vec<Vec<f64>>) -> Result<Self> {
        let n = mean_returns.len();
        if n == 0 {
            return Err(CoreError::EmptyUniverse);
        }
        if covariance.len() != n {
            return Err(CoreError::DimensionMismatch {
                expected: n,
                actual: covariance.len(),
            });
        }
        for (row, values) in covariance.iter().enumerate() {
            if values.len() != n {
                return Err(CoreError::RaggedCovariance {
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
        }
        Ok(Self {
            mean_returns,
            covariance,
        })
    }

    /// Number of assets in the universe
    pub fn num_assets(&self) -> usize {
        self.mean_returns.len()
    }

    /// Annualized expected return per asset
    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    /// Annualized covariance matrix
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    /// Index of the asset with the highest expected return
    pub fn argmax_return(&self) -> usize {
        let mut best = 0;
        for i in 1..self.mean_returns.len() {
            if self.mean_returns[i] > self.mean_returns[best] {
                best = i;
            }
        }
        best
    }

    /// Restrict the universe to the given asset indices
    ///
    /// Produces the sub-problem (return vector and covariance sub-matrix)
    /// used when reweighting a binary selection. Indices must be valid
    /// and are taken in the given order.
    pub fn restrict(&self, indices: &[usize]) -> Self {
        let mean_returns = indices.iter().map(|&i| self.mean_returns[i]).collect();
        let covariance = indices
            .iter()
            .map(|&i| indices.iter().map(|&j| self.covariance[i][j]).collect())
            .collect();
        Self {
            mean_returns,
            covariance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert_eq!(MarketData::new(vec![], vec![]), Err(CoreError::EmptyUniverse));

        let bad = MarketData::new(vec![0.1, 0.2], vec![vec![0.04, 0.01]]);
        assert_eq!(
            bad,
            Err(CoreError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );

        let ragged = MarketData::new(vec![0.1, 0.2], vec![vec![0.04, 0.01], vec![0.01]]);
        assert!(matches!(ragged, Err(CoreError::RaggedCovariance { row: 1, .. })));
    }

    #[test]
    fn test_restrict() {
        let market = MarketData::new(
            vec![0.1, 0.2, 0.3],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![2.0, 4.0, 5.0],
                vec![3.0, 5.0, 6.0],
            ],
        )
        .unwrap();

        let sub = market.restrict(&[0, 2]);
        assert_eq!(sub.num_assets(), 2);
        assert_eq!(sub.mean_returns(), &[0.1, 0.3]);
        assert_eq!(sub.covariance()[0], vec![1.0, 3.0]);
        assert_eq!(sub.covariance()[1], vec![3.0, 6.0]);
    }

    #[test]
    fn test_argmax_return() {
        let market = MarketData::new(
            vec![0.05, 0.3, 0.1],
            vec![vec![1.0; 3], vec![1.0; 3], vec![1.0; 3]],
        )
        .unwrap();
        assert_eq!(market.argmax_return(), 1);
    }
}
