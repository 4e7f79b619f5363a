//! QUBO matrix construction
//!
//! Builds the quadratic binary objective `x^T Q x` minimized by the
//! variational loop. The two competing financial terms:
//!
//! - covariance risk on all entries (small is good)
//! - expected return subtracted from the diagonal (large is good)
//!
//! Both are normalized by their own max-abs scale so the risk tolerance
//! blends them consistently across inputs of different magnitude. An
//! optional soft cardinality penalty `A * (sum(x) - K)^2` steers the
//! selection count toward the midpoint K of the requested range.

use crate::market::MarketData;

/// Minimum cardinality-penalty strength, guards against a zero penalty
/// when Q is identically zero.
const MIN_PENALTY: f64 = 1e-6;

/// Dense n×n QUBO matrix
///
/// Not required to be symmetric; consumers symmetrize off-diagonal pairs
/// as `Q[i,j] + Q[j,i]`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    n: usize,
    data: Vec<f64>,
}

impl QuboMatrix {
    fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Matrix dimension (number of assets / qubits)
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Largest absolute entry
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }

    /// Evaluate the objective `x^T Q x` for a binary vector
    ///
    /// Entries beyond `bits.len()` are treated as unselected.
    pub fn evaluate(&self, bits: &[u8]) -> f64 {
        let mut value = 0.0;
        for i in 0..self.n {
            if bits.get(i).copied().unwrap_or(0) == 0 {
                continue;
            }
            for j in 0..self.n {
                if bits.get(j).copied().unwrap_or(0) == 1 {
                    value += self[(i, j)];
                }
            }
        }
        value
    }
}

impl std::ops::Index<(usize, usize)> for QuboMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.n + j]
    }
}

impl std::ops::IndexMut<(usize, usize)> for QuboMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.n + j]
    }
}

/// Build the QUBO matrix for a portfolio-selection problem
///
/// `risk_tolerance` blends risk against return: 0 is pure risk
/// minimization, 1 is pure return maximization. `cardinality` optionally
/// bounds the selection count; the bounds are clamped into `[1, n]` and
/// realized as the expanded quadratic penalty
///
/// ```text
/// A * (1 - 2K) * sum(x_i)  +  A * sum_{i != j} x_i x_j  +  const
/// ```
///
/// with `K` the midpoint of the clamped range and the strength `A` set to
/// the max-abs scale of the financial objective before the penalty is
/// added, so the cardinality signal is competitive but not overwhelming.
pub fn build_qubo(
    market: &MarketData,
    risk_tolerance: f64,
    cardinality: Option<(usize, usize)>,
) -> QuboMatrix {
    let n = market.num_assets();
    let returns = market.mean_returns();
    let cov = market.covariance();

    // Normalization scales; a zero matrix falls back to 1.0
    let ret_scale = returns
        .iter()
        .fold(0.0_f64, |acc, &r| acc.max(r.abs()))
        .max(0.0);
    let ret_scale = if ret_scale > 0.0 { ret_scale } else { 1.0 };
    let cov_scale = cov
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, &c| acc.max(c.abs()));
    let cov_scale = if cov_scale > 0.0 { cov_scale } else { 1.0 };

    let mut q = QuboMatrix::zeros(n);
    for i in 0..n {
        for j in 0..n {
            q[(i, j)] = cov[i][j] / cov_scale;
        }
        q[(i, i)] -= risk_tolerance * returns[i] / ret_scale;
    }

    if let Some((min_assets, max_assets)) = cardinality {
        let lo = min_assets.clamp(1, n);
        let hi = max_assets.clamp(1, n);
        let k = (lo + hi) as f64 / 2.0;

        // Penalty strength from the pre-penalty objective scale
        let a = q.max_abs().max(MIN_PENALTY);

        for i in 0..n {
            q[(i, i)] += a * (1.0 - 2.0 * k);
            for j in 0..n {
                if i != j {
                    q[(i, j)] += a;
                }
            }
        }
    }

    q
}
