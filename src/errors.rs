//! Error types shared by the registry, the store and the HTTP layer.

use thiserror::Error;

/// Everything that can go wrong while issuing, validating or persisting licenses.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A required parameter was missing or empty.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The duration specification did not contain a recognizable unit.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Reading or writing the license file failed.
    #[error("storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// The license file content is not a well-formed list of licenses.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("server error: {0}")]
    ServerError(String),
}

pub type LicenseResult<T> = Result<T, LicenseError>;
