//! Binary asset selections
//!
//! An allocation is a binary vector over the asset universe: 1 selects
//! the asset, 0 excludes it. Allocations are produced by best-bitstring
//! extraction, adjusted in place by cardinality repair, and finally
//! converted into continuous weights.

/// Binary selection vector over the asset universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    bits: Vec<u8>,
}

impl Allocation {
    /// All-zero allocation of the given length
    pub fn empty(n: usize) -> Self {
        Self { bits: vec![0; n] }
    }

    /// Build from a binary vector in natural order (entry `i` = asset `i`)
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self { bits }
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if the universe is empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Underlying binary vector
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Whether asset `i` is selected
    pub fn is_selected(&self, i: usize) -> bool {
        self.bits[i] == 1
    }

    /// Mark asset `i` as selected
    pub fn select(&mut self, i: usize) {
        self.bits[i] = 1;
    }

    /// Mark asset `i` as unselected
    pub fn deselect(&mut self, i: usize) {
        self.bits[i] = 0;
    }

    /// Number of selected assets
    pub fn selected_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// Indices of selected assets in ascending order
    pub fn selected_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == 1)
            .map(|(i, _)| i)
            .collect()
    }

    /// Scatter per-selection values back into a full-length weight vector
    ///
    /// `values[k]` is assigned to the k-th selected asset; unselected
    /// entries are 0. The value count must match the selection count.
    pub fn scatter(&self, values: &[f64]) -> Vec<f64> {
        let mut weights = vec![0.0; self.bits.len()];
        for (k, i) in self.selected_indices().into_iter().enumerate() {
            weights[i] = values[k];
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_counts() {
        let mut alloc = Allocation::empty(4);
        assert_eq!(alloc.selected_count(), 0);

        alloc.select(1);
        alloc.select(3);
        assert_eq!(alloc.selected_count(), 2);
        assert_eq!(alloc.selected_indices(), vec![1, 3]);

        alloc.deselect(1);
        assert_eq!(alloc.selected_indices(), vec![3]);
    }

    #[test]
    fn test_scatter() {
        let alloc = Allocation::from_bits(vec![0, 1, 0, 1]);
        let weights = alloc.scatter(&[0.4, 0.6]);
        assert_eq!(weights, vec![0.0, 0.4, 0.0, 0.6]);
    }
}
