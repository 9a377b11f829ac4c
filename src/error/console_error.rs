//! Unified error type for the connectivity layer.

use thiserror::Error;

use super::api::ApiError;
use super::category::ErrorCategory;
use super::config::ConfigError;
use super::storage::StorageError;
use super::transport::TransportError;

/// Unified error type consolidating every domain error.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used across the crate's fallible public APIs.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::Transport(err) => err.category(),
            ConsoleError::Api(err) => err.category(),
            ConsoleError::Storage(_) => ErrorCategory::System,
            ConsoleError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Transport(err) => err.error_code(),
            ConsoleError::Api(err) => err.error_code(),
            ConsoleError::Storage(err) => err.error_code(),
            ConsoleError::Config(_) => "E_CONFIG",
        }
    }
}
