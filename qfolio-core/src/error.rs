//! Error types for problem construction

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building the optimization problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Return vector and covariance matrix disagree on the asset count
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No assets were supplied
    #[error("Asset universe is empty")]
    EmptyUniverse,

    /// Covariance matrix row has the wrong length
    #[error("Covariance row {row} has length {len}, expected {expected}")]
    RaggedCovariance {
        row: usize,
        len: usize,
        expected: usize,
    },
}
