//! Hard cardinality repair
//!
//! The QUBO's cardinality penalty is soft: sampled bitstrings can still
//! land outside the requested selection range. This pass deterministically
//! forces the count back into bounds, using expected return as the
//! ranking criterion — the cheapest information already at hand.

use qfolio_core::Allocation;
use std::cmp::Ordering;

/// Force the selection count into the requested range
///
/// Under-selected allocations gain the highest-return unselected assets;
/// over-selected allocations shed the lowest-return selected assets.
/// Absent bounds, or a count already in range, the allocation is
/// untouched. Never fails; bounds are pre-validated upstream.
pub fn repair_cardinality(
    allocation: &mut Allocation,
    mean_returns: &[f64],
    bounds: Option<(usize, usize)>,
) {
    let Some((lo, hi)) = bounds else {
        return;
    };

    let count = allocation.selected_count();

    if count < lo {
        // Rank unselected assets by descending return and fill up
        let mut candidates: Vec<usize> = (0..allocation.len())
            .filter(|&i| !allocation.is_selected(i))
            .collect();
        candidates.sort_by(|&a, &b| {
            mean_returns[b]
                .partial_cmp(&mean_returns[a])
                .unwrap_or(Ordering::Equal)
        });

        for &i in candidates.iter().take(lo - count) {
            allocation.select(i);
        }
    } else if count > hi {
        // Rank selected assets by ascending return and shed the worst
        let mut holdings: Vec<usize> = allocation.selected_indices();
        holdings.sort_by(|&a, &b| {
            mean_returns[a]
                .partial_cmp(&mean_returns[b])
                .unwrap_or(Ordering::Equal)
        });

        for &i in holdings.iter().take(count - hi) {
            allocation.deselect(i);
        }
    }
}
