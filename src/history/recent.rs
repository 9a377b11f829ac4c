//! Recent walk targets, offered as suggestions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{HistoryRecord, HistoryStore};
use crate::error::StorageError;
use crate::traits::DurableStorage;

pub const RECENT_TARGETS_KEY: &str = "trishul_recent_targets";
pub const RECENT_TARGETS_CAPACITY: usize = 10;

/// One walk target as last used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTarget {
    pub target: String,
    pub port: u16,
    #[serde(default)]
    pub community: String,
    #[serde(default)]
    pub oid: String,
    pub last_used: DateTime<Utc>,
}

impl HistoryRecord for RecentTarget {
    type Id = (String, u16, String);

    fn identity(&self) -> Self::Id {
        (self.target.clone(), self.port, self.oid.clone())
    }

    fn recency(&self) -> f64 {
        self.last_used.timestamp_millis() as f64
    }
}

/// Most-recently-used walk targets.
///
/// Unlike event history, re-recording an existing target moves it to the
/// head instead of being ignored.
#[derive(Debug)]
pub struct RecentTargets {
    store: HistoryStore<RecentTarget>,
}

impl RecentTargets {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self::with_capacity(storage, RECENT_TARGETS_CAPACITY)
    }

    pub fn with_capacity(storage: Arc<dyn DurableStorage>, capacity: usize) -> Self {
        Self {
            store: HistoryStore::new(RECENT_TARGETS_KEY, capacity, storage),
        }
    }

    /// Load the durable list.
    pub fn load(&mut self) -> usize {
        self.store.restore()
    }

    /// Record a use of `target` and persist.
    pub fn record(&mut self, target: RecentTarget) -> Result<(), StorageError> {
        self.store.remove(&target.identity());
        self.store.append(target);
        self.store.persist()
    }

    /// Targets, most recent first.
    pub fn list(&self) -> Vec<RecentTarget> {
        self.store.entries().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }
}
