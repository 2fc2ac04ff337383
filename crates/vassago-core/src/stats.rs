//! Mask statistics: realized sparsity and reduction estimates

use crate::{COMPUTE_REDUCTION_FACTOR, MAX_REDUCTION_RATIO};
use serde::{Deserialize, Serialize};

/// Derived statistics of a generated mask.
///
/// Computed once when the mask is built and never independently mutated.
/// The reduction ratios are deterministic closed-form estimates derived
/// from the nonzero count; nothing here is measured or simulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    /// Total number of cells (`n * n`).
    pub total_elements: u64,
    /// Number of permitted attention relations.
    pub nonzero_elements: u64,
    /// `1 - nonzero / total`: fraction of attention pairs never computed.
    pub memory_reduction_ratio: f64,
    /// Estimated compute reduction: `min(0.99, memory_reduction * 1.2)`.
    pub compute_reduction_ratio: f64,
}

impl MaskStatistics {
    /// Build statistics from a sequence length and nonzero count.
    pub fn from_counts(size: usize, nonzero_elements: u64) -> Self {
        let total_elements = (size * size) as u64;
        let memory_reduction_ratio = if total_elements == 0 {
            0.0
        } else {
            1.0 - nonzero_elements as f64 / total_elements as f64
        };
        let compute_reduction_ratio =
            (memory_reduction_ratio * COMPUTE_REDUCTION_FACTOR).min(MAX_REDUCTION_RATIO);
        Self {
            total_elements,
            nonzero_elements,
            memory_reduction_ratio,
            compute_reduction_ratio,
        }
    }

    /// Realized sparsity: fraction of cells that are `false`.
    pub fn sparsity(&self) -> f64 {
        self.memory_reduction_ratio
    }

    /// Fraction of cells that are `true`.
    pub fn density(&self) -> f64 {
        1.0 - self.memory_reduction_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_ratios_from_counts() {
        let stats = MaskStatistics::from_counts(10, 20);
        assert_eq!(stats.total_elements, 100);
        assert!((stats.memory_reduction_ratio - 0.8).abs() < 1e-12);
        assert!((stats.compute_reduction_ratio - 0.96).abs() < 1e-12);
    }

    #[test]
    fn compute_reduction_is_capped() {
        let stats = MaskStatistics::from_counts(100, 100);
        assert!(stats.memory_reduction_ratio > 0.98);
        assert_eq!(stats.compute_reduction_ratio, 0.99);
    }

    #[test]
    fn dense_mask_has_no_reduction() {
        let stats = MaskStatistics::from_counts(8, 64);
        assert_eq!(stats.sparsity(), 0.0);
        assert_eq!(stats.density(), 1.0);
        assert_eq!(stats.compute_reduction_ratio, 0.0);
    }
}
