//! Error types for Stashline

use thiserror::Error;

/// Main error type for Stashline
#[derive(Error, Debug)]
pub enum StashlineError {
    // ============ Storage Errors ============
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    // ============ Serialization Errors ============
    #[error("Failed to encode state: {0}")]
    EncodeFailed(String),

    #[error("Failed to decode stored state: {0}")]
    DecodeFailed(String),

    // ============ Usage Errors ============
    #[error("Usage error: {0}")]
    UsageError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StashlineError {
    pub fn is_usage_error(&self) -> bool {
        matches!(self, StashlineError::UsageError(_))
    }
}

impl From<std::io::Error> for StashlineError {
    fn from(err: std::io::Error) -> Self {
        StashlineError::StorageUnavailable(err.to_string())
    }
}
