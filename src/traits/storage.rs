//! Durable key-value storage abstraction.
//!
//! The console persists history and UI state as JSON strings under fixed
//! per-module keys. Storage is process-wide; keys are the only isolation.

use crate::error::StorageError;

/// Trait for durable client-side storage.
///
/// Implementations must treat a missing key as `Ok(None)`, not an error.
pub trait DurableStorage: Send + Sync {
    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
