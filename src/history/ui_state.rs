//! Per-module saved UI state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StorageError;
use crate::traits::DurableStorage;

pub const UI_STATE_KEY_PREFIX: &str = "trishul_ui_state_";

/// JSON-serialized UI state, one key per module.
#[derive(Clone)]
pub struct UiStateStore {
    storage: Arc<dyn DurableStorage>,
}

impl UiStateStore {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    pub fn key_for(module: &str) -> String {
        format!("{}{}", UI_STATE_KEY_PREFIX, module)
    }

    pub fn save<S: Serialize>(&self, module: &str, state: &S) -> Result<(), StorageError> {
        let key = Self::key_for(module);
        let json = serde_json::to_string(state).map_err(|e| StorageError::encode(&key, e))?;
        self.storage.save(&key, &json)
    }

    /// Saved state for `module`, or `None` when absent or unreadable.
    pub fn load<S: DeserializeOwned>(&self, module: &str) -> Option<S> {
        let key = Self::key_for(module);
        let loaded = self.storage.load(&key).and_then(|json| {
            json.map(|j| serde_json::from_str(&j).map_err(|e| StorageError::corrupt(&key, e)))
                .transpose()
        });
        match loaded {
            Ok(state) => state,
            Err(e) => {
                warn!("ignoring saved UI state for {}: {}", module, e);
                None
            }
        }
    }

    pub fn clear(&self, module: &str) -> Result<(), StorageError> {
        self.storage.remove(&Self::key_for(module))
    }
}

impl std::fmt::Debug for UiStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStateStore").finish_non_exhaustive()
    }
}
