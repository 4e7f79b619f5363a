//! Error types for the optimization engine

use qfolio_backend::BackendError;
use std::fmt;

/// Result type for optimization operations
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Errors that can occur during a hybrid optimization request
#[derive(Debug)]
pub enum OptimizeError {
    /// Circuit execution failed; fatal for the whole request because an
    /// interrupted convergence trace cannot be salvaged
    Execution(BackendError),

    /// The problem handed to the engine is malformed
    InvalidProblem(String),

    /// The derivative-free search could not run
    SearchFailed(String),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::Execution(err) => {
                write!(f, "Circuit execution failed: {}", err)
            }
            OptimizeError::InvalidProblem(msg) => {
                write!(f, "Invalid problem: {}", msg)
            }
            OptimizeError::SearchFailed(msg) => {
                write!(f, "Parameter search failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for OptimizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OptimizeError::Execution(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for OptimizeError {
    fn from(err: BackendError) -> Self {
        OptimizeError::Execution(err)
    }
}
