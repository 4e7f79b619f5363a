//! Derivative-free parameter search
//!
//! Nelder-Mead simplex minimization driving the variational loop. The
//! method maintains n+1 points in n-dimensional space and transforms the
//! simplex through reflection, expansion, contraction, and shrink moves,
//! observing only objective values — a good match for the noisy,
//! gradient-free cost landscape of shot-based circuit evaluation.
//!
//! The search is budgeted in objective evaluations, not tolerance: it
//! always stops after a fixed number of calls and reports the best point
//! seen anywhere, which may predate the current simplex.

use crate::error::Result;

/// Objective function evaluated by the search
///
/// Implementations may carry state across calls (the variational loop's
/// accumulator records every value it returns), hence `&mut self`.
pub trait Objective {
    /// Evaluate the objective at a candidate point
    fn evaluate(&mut self, point: &[f64]) -> Result<f64>;
}

/// Configuration for the Nelder-Mead search
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Total objective-evaluation budget
    pub max_evaluations: usize,

    /// Reflection coefficient
    pub alpha: f64,

    /// Expansion coefficient
    pub gamma: f64,

    /// Contraction coefficient
    pub rho: f64,

    /// Shrink coefficient
    pub sigma: f64,

    /// Relative size of the initial simplex perturbation
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 200,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

impl NelderMeadConfig {
    /// Create a configuration with the given evaluation budget
    pub fn with_budget(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            ..Default::default()
        }
    }
}

/// Outcome of a search run
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best point observed across all evaluations
    pub best_point: Vec<f64>,

    /// Objective value at the best point
    pub best_value: f64,

    /// Number of objective evaluations spent
    pub evaluations: usize,
}

/// Tracks the evaluation budget and the best point seen so far
struct BudgetedObjective<'a, O: Objective + ?Sized> {
    objective: &'a mut O,
    used: usize,
    budget: usize,
    best_point: Vec<f64>,
    best_value: f64,
}

impl<'a, O: Objective + ?Sized> BudgetedObjective<'a, O> {
    fn new(objective: &'a mut O, budget: usize) -> Self {
        Self {
            objective,
            used: 0,
            budget,
            best_point: Vec::new(),
            best_value: f64::INFINITY,
        }
    }

    /// Evaluate unless the budget is spent; `Ok(None)` means exhausted
    fn try_evaluate(&mut self, point: &[f64]) -> Result<Option<f64>> {
        if self.used >= self.budget {
            return Ok(None);
        }
        self.used += 1;
        let value = self.objective.evaluate(point)?;
        if value < self.best_value {
            self.best_value = value;
            self.best_point = point.to_vec();
        }
        Ok(Some(value))
    }
}

/// Minimize an objective with the Nelder-Mead simplex method
///
/// Runs until the evaluation budget is spent and returns the best point
/// observed. Objective errors abort the search immediately and propagate
/// unmodified.
pub fn minimize<O: Objective + ?Sized>(
    objective: &mut O,
    initial: &[f64],
    config: &NelderMeadConfig,
) -> Result<SearchOutcome> {
    let n = initial.len();
    let mut tracker = BudgetedObjective::new(objective, config.max_evaluations);

    // Initial simplex: the start point plus one perturbed vertex per
    // dimension
    let mut simplex = initialize_simplex(initial, config.initial_step);
    let mut values = Vec::with_capacity(n + 1);
    for vertex in &simplex {
        match tracker.try_evaluate(vertex)? {
            Some(v) => values.push(v),
            None => {
                values.push(f64::INFINITY);
            },
        }
    }

    loop {
        // Order vertices by value
        let mut indices: Vec<usize> = (0..simplex.len()).collect();
        indices.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best_idx = indices[0];
        let worst_idx = indices[n];
        let second_worst_idx = indices[n - 1];

        // Centroid of all points except the worst
        let centroid = compute_centroid(&simplex, &indices[..n]);

        // Reflection
        let reflected = affine(&centroid, &simplex[worst_idx], -config.alpha);
        let reflected_value = match tracker.try_evaluate(&reflected)? {
            Some(v) => v,
            None => break,
        };

        if reflected_value < values[best_idx] {
            // Expansion
            let expanded = affine(&centroid, &reflected, config.gamma);
            match tracker.try_evaluate(&expanded)? {
                Some(expanded_value) if expanded_value < reflected_value => {
                    simplex[worst_idx] = expanded;
                    values[worst_idx] = expanded_value;
                },
                Some(_) => {
                    simplex[worst_idx] = reflected;
                    values[worst_idx] = reflected_value;
                },
                None => break,
            }
        } else if reflected_value < values[second_worst_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
        } else {
            // Contraction, outside or inside of the worst vertex
            let contracted = if reflected_value < values[worst_idx] {
                affine(&centroid, &reflected, config.rho)
            } else {
                affine(&centroid, &simplex[worst_idx], config.rho)
            };
            let contracted_value = match tracker.try_evaluate(&contracted)? {
                Some(v) => v,
                None => break,
            };

            if contracted_value < values[worst_idx].min(reflected_value) {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
            } else {
                // Shrink toward the best vertex
                let best_point = simplex[best_idx].clone();
                let mut exhausted = false;
                for i in 0..simplex.len() {
                    if i == best_idx {
                        continue;
                    }
                    for d in 0..n {
                        simplex[i][d] =
                            best_point[d] + config.sigma * (simplex[i][d] - best_point[d]);
                    }
                    match tracker.try_evaluate(&simplex[i])? {
                        Some(v) => values[i] = v,
                        None => {
                            exhausted = true;
                            break;
                        },
                    }
                }
                if exhausted {
                    break;
                }
            }
        }
    }

    // The simplex may have drifted past the best observation; report the
    // best point actually evaluated.
    let (best_point, best_value) = if tracker.best_point.is_empty() {
        (initial.to_vec(), f64::INFINITY)
    } else {
        (tracker.best_point.clone(), tracker.best_value)
    };

    Ok(SearchOutcome {
        best_point,
        best_value,
        evaluations: tracker.used,
    })
}

/// Initial simplex: perturb each dimension of the start point
fn initialize_simplex(initial: &[f64], step: f64) -> Vec<Vec<f64>> {
    let mut simplex = vec![initial.to_vec()];
    for i in 0..initial.len() {
        let mut vertex = initial.to_vec();
        vertex[i] += if vertex[i].abs() > 1e-10 {
            vertex[i] * step
        } else {
            step
        };
        simplex.push(vertex);
    }
    simplex
}

/// Centroid of the given vertices
fn compute_centroid(simplex: &[Vec<f64>], indices: &[usize]) -> Vec<f64> {
    let n = simplex[0].len();
    let mut centroid = vec![0.0; n];
    for &idx in indices {
        for d in 0..n {
            centroid[d] += simplex[idx][d];
        }
    }
    for c in centroid.iter_mut() {
        *c /= indices.len() as f64;
    }
    centroid
}

/// Point `centroid + t * (target - centroid)`
fn affine(centroid: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(target.iter())
        .map(|(&c, &x)| c + t * (x - c))
        .collect()
}
