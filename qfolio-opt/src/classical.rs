//! Classical mean-variance optimization
//!
//! Solves the continuous Markowitz relaxation
//!
//! ```text
//! minimize   w' S w - lambda * mu' w
//! subject to sum(w) = 1,  0 <= w_i <= 1
//! ```
//!
//! with projected gradient descent: the analytical gradient `2 S w -
//! lambda * mu` drives the step, and every iterate is projected back onto
//! the probability simplex (which also enforces the upper bound). The
//! inner optimizer is local, so three diverse starting points are run
//! independently and the best feasible result wins.
//!
//! This solver is both the classical comparator for the variational
//! result and the weighting primitive behind hybrid reweighting.

use qfolio_core::MarketData;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp1};
use std::cmp::Ordering;

/// Configuration for the mean-variance solver
#[derive(Debug, Clone)]
pub struct MeanVarianceConfig {
    /// Maximum gradient iterations per start
    pub max_iterations: usize,

    /// Convergence threshold on the objective decrease
    pub tolerance: f64,

    /// Maximum step halvings per line search
    pub max_line_search_steps: usize,

    /// Seed for the random start
    pub seed: Option<u64>,
}

impl Default for MeanVarianceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
            max_line_search_steps: 40,
            seed: None,
        }
    }
}

/// Solve the constrained mean-variance problem with default settings
///
/// Returns a weight vector with every entry in `[0, 1]` summing to 1.
pub fn solve_mean_variance(market: &MarketData, risk_tolerance: f64) -> Vec<f64> {
    solve_mean_variance_with(market, risk_tolerance, &MeanVarianceConfig::default())
}

/// Solve the constrained mean-variance problem
pub fn solve_mean_variance_with(
    market: &MarketData,
    risk_tolerance: f64,
    config: &MeanVarianceConfig,
) -> Vec<f64> {
    let n = market.num_assets();
    let equal = vec![1.0 / n as f64; n];

    // Three diverse starts: neutral, aggressive, and one random point on
    // the simplex
    let mut one_hot = vec![0.0; n];
    one_hot[market.argmax_return()] = 1.0;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let random = random_simplex_point(n, &mut rng);

    let starts = [equal.clone(), one_hot, random];

    let mut best: Option<(Vec<f64>, f64)> = None;
    for start in &starts {
        if let Some((weights, value)) = run_start(market, risk_tolerance, start, config) {
            let better = best
                .as_ref()
                .map(|(_, best_value)| value < *best_value)
                .unwrap_or(true);
            if better {
                best = Some((weights, value));
            }
        }
    }

    let weights = match best {
        Some((weights, _)) => weights,
        // Every start failed to converge; a neutral portfolio is a
        // usable answer where an error would not be
        None => equal,
    };

    normalize_weights(weights)
}

/// Objective `w' S w - lambda * mu' w`
fn objective(w: &[f64], market: &MarketData, risk_tolerance: f64) -> f64 {
    let cov = market.covariance();
    let mu = market.mean_returns();

    let mut variance = 0.0;
    for (i, &wi) in w.iter().enumerate() {
        for (j, &wj) in w.iter().enumerate() {
            variance += wi * cov[i][j] * wj;
        }
    }
    let ret: f64 = w.iter().zip(mu.iter()).map(|(&wi, &m)| wi * m).sum();
    variance - risk_tolerance * ret
}

/// Analytical gradient `2 S w - lambda * mu`
fn gradient(w: &[f64], market: &MarketData, risk_tolerance: f64) -> Vec<f64> {
    let cov = market.covariance();
    let mu = market.mean_returns();

    (0..w.len())
        .map(|i| {
            let sw: f64 = w.iter().zip(cov[i].iter()).map(|(&wj, &c)| wj * c).sum();
            2.0 * sw - risk_tolerance * mu[i]
        })
        .collect()
}

/// One projected-gradient run from a single starting point
///
/// Returns `None` when the iteration budget runs out before the
/// objective decrease falls below tolerance.
fn run_start(
    market: &MarketData,
    risk_tolerance: f64,
    start: &[f64],
    config: &MeanVarianceConfig,
) -> Option<(Vec<f64>, f64)> {
    let mut w = project_simplex(start);
    let mut value = objective(&w, market, risk_tolerance);

    for _ in 0..config.max_iterations {
        let grad = gradient(&w, market, risk_tolerance);

        // Backtracking line search on the projected step
        let mut step = 1.0;
        let mut improved = false;
        for _ in 0..config.max_line_search_steps {
            let candidate: Vec<f64> = w
                .iter()
                .zip(grad.iter())
                .map(|(&wi, &gi)| wi - step * gi)
                .collect();
            let candidate = project_simplex(&candidate);
            let candidate_value = objective(&candidate, market, risk_tolerance);

            if candidate_value < value {
                let decrease = value - candidate_value;
                w = candidate;
                value = candidate_value;
                improved = true;
                if decrease < config.tolerance {
                    return Some((w, value));
                }
                break;
            }
            step *= 0.5;
        }

        if !improved {
            // No descent direction left at any step size: stationary
            return Some((w, value));
        }
    }

    None
}

/// Euclidean projection onto the probability simplex
///
/// Sort-based algorithm; the unit-sum constraint also caps every entry
/// at 1, so the box constraint needs no separate handling.
fn project_simplex(v: &[f64]) -> Vec<f64> {
    let n = v.len();
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (i as f64 + 1.0);
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }

    v.iter().map(|&x| (x - theta).max(0.0)).collect()
}

/// Clip numerical noise and renormalize to an exact unit sum
fn normalize_weights(mut weights: Vec<f64>) -> Vec<f64> {
    for w in weights.iter_mut() {
        *w = w.clamp(0.0, 1.0);
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
    } else {
        let n = weights.len();
        weights = vec![1.0 / n as f64; n];
    }
    weights
}

/// Uniform random point on the probability simplex
///
/// Normalized unit-exponential draws are equivalent to a flat Dirichlet
/// sample.
fn random_simplex_point<R: rand::Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    let raw: Vec<f64> = (0..n).map(|_| Exp1.sample(rng)).collect();
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 {
        raw.iter().map(|&x| x / sum).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}
