use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::traits::DurableStorage;

/// A record that can live in a [`HistoryStore`].
pub trait HistoryRecord: Clone + Serialize + DeserializeOwned {
    /// Deduplication key. Two records with equal identity are the same record.
    type Id: Eq + Hash + Clone + Debug;

    fn identity(&self) -> Self::Id;

    /// Larger is more recent.
    fn recency(&self) -> f64;
}

/// Most-recent-first buffer capped at `capacity` entries, unique by
/// [`HistoryRecord::identity`], persisted as a JSON array under `key`.
///
/// Storage faults never escape: a failed restore leaves the store empty and
/// a failed persist leaves the in-memory buffer intact. Both are logged.
pub struct HistoryStore<T: HistoryRecord> {
    key: String,
    capacity: usize,
    entries: VecDeque<T>,
    index: HashSet<T::Id>,
    storage: Arc<dyn DurableStorage>,
}

impl<T: HistoryRecord> HistoryStore<T> {
    pub fn new(key: impl Into<String>, capacity: usize, storage: Arc<dyn DurableStorage>) -> Self {
        let capacity = capacity.max(1);
        Self {
            key: key.into(),
            capacity,
            entries: VecDeque::with_capacity(capacity),
            index: HashSet::with_capacity(capacity),
            storage,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains(id)
    }

    /// Insert at the head unless an entry with the same identity exists.
    ///
    /// Evicts the tail once over capacity. Returns whether it was inserted.
    pub fn append(&mut self, entry: T) -> bool {
        let id = entry.identity();
        if self.index.contains(&id) {
            debug!("{}: duplicate {:?} ignored", self.key, id);
            return false;
        }

        self.index.insert(id);
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                self.index.remove(&evicted.identity());
            }
        }
        true
    }

    /// Drop the entry with identity `id`, if present.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        if !self.index.remove(id) {
            return None;
        }
        let position = self.entries.iter().position(|e| &e.identity() == id)?;
        self.entries.remove(position)
    }

    /// Union `incoming` into the store.
    ///
    /// Existing entries win on identity collisions. The result is re-sorted
    /// by recency, most recent first, and cut to capacity. Returns how many
    /// incoming entries were new.
    pub fn merge<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut added = 0;
        let mut merged: Vec<T> = self.entries.drain(..).collect();
        for entry in incoming {
            if self.index.insert(entry.identity()) {
                merged.push(entry);
                added += 1;
            }
        }

        merged.sort_by(|a, b| b.recency().total_cmp(&a.recency()));
        merged.truncate(self.capacity);

        self.index = merged.iter().map(T::identity).collect();
        self.entries = merged.into();
        added
    }

    /// Write the whole buffer to durable storage.
    pub fn persist(&self) -> Result<(), StorageError> {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| StorageError::encode(&self.key, e))
            .and_then(|json| self.storage.save(&self.key, &json));

        if let Err(e) = &result {
            warn!("failed to persist {}: {}", self.key, e);
        }
        result
    }

    /// Merge the durable copy into the store. Returns how many entries it added.
    pub fn restore(&mut self) -> usize {
        match self.load() {
            Ok(stored) => self.merge(stored),
            Err(e) => {
                warn!("no history restored for {}: {}", self.key, e);
                0
            }
        }
    }

    /// Empty the buffer and the durable copy.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        if let Err(e) = self.storage.remove(&self.key) {
            warn!("failed to clear {}: {}", self.key, e);
        }
    }

    fn load(&self) -> Result<Vec<T>, StorageError> {
        match self.storage.load(&self.key)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| StorageError::corrupt(&self.key, e)),
            None => Ok(Vec::new()),
        }
    }
}

impl<T: HistoryRecord + Debug> Debug for HistoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MemoryStorage;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Line {
        id: String,
        at: f64,
    }

    impl HistoryRecord for Line {
        type Id = String;

        fn identity(&self) -> String {
            self.id.clone()
        }

        fn recency(&self) -> f64 {
            self.at
        }
    }

    fn line(id: &str, at: f64) -> Line {
        Line {
            id: id.to_string(),
            at,
        }
    }

    fn ids(store: &HistoryStore<Line>) -> Vec<String> {
        store.entries().map(|l| l.id.clone()).collect()
    }

    fn store(capacity: usize) -> (HistoryStore<Line>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (
            HistoryStore::new("test_history", capacity, Arc::new(storage.clone())),
            storage,
        )
    }

    #[test]
    fn test_append_is_idempotent() {
        let (mut store, _) = store(5);
        assert!(store.append(line("a", 1.0)));
        assert!(!store.append(line("a", 1.0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_append_inserts_at_head() {
        let (mut store, _) = store(5);
        store.append(line("a", 1.0));
        store.append(line("b", 2.0));
        assert_eq!(ids(&store), vec!["b", "a"]);
        assert_eq!(store.latest().map(|l| l.id.as_str()), Some("b"));
    }

    #[test]
    fn test_full_store_evicts_oldest() {
        let (mut store, _) = store(3);
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            store.append(line(id, i as f64));
        }
        store.append(line("d", 3.0));

        assert_eq!(store.len(), 3);
        assert!(!store.contains(&"a".to_string()));
        assert_eq!(ids(&store), vec!["d", "c", "b"]);

        // An evicted identity may come back.
        assert!(store.append(line("a", 4.0)));
    }

    #[test]
    fn test_remove() {
        let (mut store, _) = store(5);
        store.append(line("a", 1.0));
        store.append(line("b", 2.0));

        assert_eq!(store.remove(&"a".to_string()), Some(line("a", 1.0)));
        assert_eq!(store.remove(&"a".to_string()), None);
        assert_eq!(ids(&store), vec!["b"]);
        assert!(store.append(line("a", 3.0)));
    }

    #[test]
    fn test_merge_unions_and_sorts() {
        let (mut store, _) = store(10);
        store.append(line("live", 5.0));

        let added = store.merge(vec![line("old", 1.0), line("live", 5.0), line("mid", 3.0)]);
        assert_eq!(added, 2);
        assert_eq!(ids(&store), vec!["live", "mid", "old"]);
    }

    #[test]
    fn test_merge_keeps_existing_on_collision() {
        let (mut store, _) = store(10);
        store.append(line("a", 2.0));
        store.merge(vec![line("a", 9.0)]);
        assert_eq!(store.latest().map(|l| l.at), Some(2.0));
    }

    #[test]
    fn test_merge_truncates_to_capacity() {
        let (mut store, _) = store(2);
        store.merge(vec![line("a", 1.0), line("b", 2.0), line("c", 3.0)]);
        assert_eq!(ids(&store), vec!["c", "b"]);
        assert!(!store.contains(&"a".to_string()));
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let (mut store, storage) = store(10);
        store.append(line("a", 1.0));
        store.append(line("b", 2.0));
        store.persist().unwrap();

        let mut reloaded: HistoryStore<Line> =
            HistoryStore::new("test_history", 10, Arc::new(storage));
        assert_eq!(reloaded.restore(), 2);
        assert_eq!(ids(&reloaded), vec!["b", "a"]);
    }

    #[test]
    fn test_corrupt_history_restores_empty() {
        let (mut store, storage) = store(10);
        storage.insert_raw("test_history", "{definitely not an array");
        assert_eq!(store.restore(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_storage_faults_are_contained() {
        let (mut store, storage) = store(10);
        storage.fail_loads(true);
        storage.fail_saves(true);

        assert_eq!(store.restore(), 0);
        store.append(line("a", 1.0));
        assert!(store.persist().is_err());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_removes_durable_copy() {
        let (mut store, storage) = store(10);
        store.append(line("a", 1.0));
        store.persist().unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(storage.get_raw("test_history"), None);
    }
}
