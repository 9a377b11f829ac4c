//! Durable storage errors.

use thiserror::Error;

/// Failures of the client-side durable store.
///
/// These are always caught at the history boundary, logged, and treated as
/// "no history available"; they never abort module initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o error for '{key}': {message}")]
    Io { key: String, message: String },

    /// The stored value could not be decoded.
    #[error("corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// The value could not be encoded for storage.
    #[error("failed to encode value for '{key}': {message}")]
    Encode { key: String, message: String },

    /// No data directory could be resolved for this platform.
    #[error("no data directory available")]
    NoDataDirectory,
}

impl StorageError {
    pub fn io(key: &str, err: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn corrupt(key: &str, err: serde_json::Error) -> Self {
        StorageError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn encode(key: &str, err: serde_json::Error) -> Self {
        StorageError::Encode {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "E_STORE_IO",
            StorageError::Corrupt { .. } => "E_STORE_CORRUPT",
            StorageError::Encode { .. } => "E_STORE_ENCODE",
            StorageError::NoDataDirectory => "E_STORE_NODIR",
        }
    }
}
