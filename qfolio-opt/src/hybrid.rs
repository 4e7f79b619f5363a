//! Hybrid reweighting
//!
//! Converts a binary selection into continuous weights by handing the
//! selected subset to the classical mean-variance solver and scattering
//! the sub-weights back over the full universe. Degenerate selections
//! get deterministic fallbacks instead of errors: a single asset takes
//! everything, an empty selection becomes the equal-weight portfolio.

use crate::classical::{solve_mean_variance_with, MeanVarianceConfig};
use qfolio_core::{Allocation, MarketData};

/// Weight a repaired selection over the full asset universe
pub fn reweight(allocation: &Allocation, market: &MarketData, risk_tolerance: f64) -> Vec<f64> {
    reweight_with(
        allocation,
        market,
        risk_tolerance,
        &MeanVarianceConfig::default(),
    )
}

/// Weight a repaired selection, with solver configuration
pub fn reweight_with(
    allocation: &Allocation,
    market: &MarketData,
    risk_tolerance: f64,
    config: &MeanVarianceConfig,
) -> Vec<f64> {
    let n = market.num_assets();
    let selected = allocation.selected_indices();

    match selected.len() {
        // Nothing sampled: a neutral portfolio is still a usable answer
        0 => vec![1.0 / n as f64; n],

        1 => allocation.scatter(&[1.0]),

        _ => {
            let sub_market = market.restrict(&selected);
            let sub_weights = solve_mean_variance_with(&sub_market, risk_tolerance, config);
            allocation.scatter(&sub_weights)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market() -> MarketData {
        MarketData::new(
            vec![0.08, 0.12, 0.15, 0.1],
            vec![
                vec![0.04, 0.006, 0.012, 0.002],
                vec![0.006, 0.09, 0.018, 0.004],
                vec![0.012, 0.018, 0.16, 0.006],
                vec![0.002, 0.004, 0.006, 0.05],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_single_selection_takes_full_weight() {
        let allocation = Allocation::from_bits(vec![0, 0, 1, 0]);
        let weights = reweight(&allocation, &market(), 0.5);

        assert_eq!(weights, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_selection_falls_back_to_equal_weight() {
        let allocation = Allocation::empty(4);
        let weights = reweight(&allocation, &market(), 0.5);

        for &w in &weights {
            assert_relative_eq!(w, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_subset_weights_scattered_back() {
        let allocation = Allocation::from_bits(vec![1, 0, 1, 0]);
        let config = MeanVarianceConfig {
            seed: Some(5),
            ..Default::default()
        };
        let weights = reweight_with(&allocation, &market(), 0.5, &config);

        // Unselected entries stay zero
        assert_eq!(weights[1], 0.0);
        assert_eq!(weights[3], 0.0);

        // Selected entries carry the whole budget
        let total: f64 = weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        assert!(weights[0] > 0.0 && weights[2] > 0.0);
    }
}
