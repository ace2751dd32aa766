//! Error types for NewsVault
//!
//! Every fallible operation in the crate returns `AppError`. Remote
//! transfer failures carry a transient flag so the retry layer can decide
//! whether another attempt is worthwhile; authorization and validation
//! failures are permanent and surface immediately.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file or value is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required remote credential fields are missing
    #[error("Remote storage is not configured: missing {0}")]
    ConfigIncomplete(String),

    /// S3 client could not be constructed (local validation, no network)
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Remote object does not exist
    #[error("Remote object not found: {0}")]
    RemoteNotFound(String),

    /// Transport or service failure during list/get/put
    #[error("Remote transfer failed: {message}")]
    RemoteTransfer { message: String, transient: bool },

    /// Local filesystem failure
    #[error("Local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// SQLite failure in a daily data file
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::RemoteTransfer {
                transient: true,
                ..
            }
        )
    }

    pub(crate) fn transfer(message: impl Into<String>, transient: bool) -> Self {
        AppError::RemoteTransfer {
            message: message.into(),
            transient,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn only_transient_transfers_are_retryable() {
        assert!(AppError::transfer("connection reset", true).is_transient());
        assert!(!AppError::transfer("access denied", false).is_transient());
        assert!(!AppError::RemoteNotFound("news/2025-12-17.db".to_string()).is_transient());
        assert!(!AppError::Config("bad value".to_string()).is_transient());
    }
}
