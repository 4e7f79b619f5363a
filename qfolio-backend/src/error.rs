//! Error types for backend operations

use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur during circuit execution
#[derive(Error, Debug)]
pub enum BackendError {
    /// Ansatz is not compatible with this backend
    #[error("Ansatz incompatible with backend: {0}")]
    AnsatzIncompatible(String),

    /// Too many qubits for this backend
    #[error("Too many qubits: ansatz needs {requested}, backend supports {limit}")]
    TooManyQubits { requested: usize, limit: usize },

    /// Wrong number of angle values for the ansatz
    #[error("Expected {expected} angle values, got {actual}")]
    AngleCountMismatch { expected: usize, actual: usize },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Job submission failed
    #[error("Job submission failed: {0}")]
    JobSubmissionFailed(String),

    /// Job execution failed on the device
    #[error("Job execution failed: {0}")]
    JobExecutionFailed(String),

    /// Job did not complete within the polling budget
    #[error("Job timeout after {attempts} polling attempts")]
    JobTimeout { attempts: usize },

    /// No device satisfied the selection constraints
    #[error("No eligible device: {0}")]
    NoEligibleDevice(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::NetworkError(err.to_string())
    }
}
