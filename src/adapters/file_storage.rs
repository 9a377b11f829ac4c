//! File-backed durable storage: one JSON file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::traits::DurableStorage;

/// Directory name under the platform data directory.
const APP_DIR: &str = "trishul-link";

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<platform data dir>/trishul-link`, e.g. `~/.local/share/trishul-link`.
    pub fn default_location() -> Result<Self, StorageError> {
        dirs::data_dir()
            .map(|d| Self::new(d.join(APP_DIR)))
            .ok_or(StorageError::NoDataDirectory)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Percent-encoded, so distinct keys never share a file and `/` cannot
    /// leave the directory.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl DurableStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(key, e))?;

        // Write then rename so a crash never leaves a half-written file behind.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| StorageError::io(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(key, e))?;
        debug!("saved {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.load("trishul_received_traps").unwrap(), None);
    }

    #[test]
    fn test_save_load_remove() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.save("trishul_sim_logs", "[1,2,3]").unwrap();
        assert_eq!(
            storage.load("trishul_sim_logs").unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert!(dir.path().join("nested/trishul_sim_logs.json").exists());

        storage.remove("trishul_sim_logs").unwrap();
        assert_eq!(storage.load("trishul_sim_logs").unwrap(), None);
        storage.remove("trishul_sim_logs").unwrap();
    }

    #[test]
    fn test_keys_cannot_escape_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.save("../evil/key", "x").unwrap();
        assert!(dir.path().join("..%2Fevil%2Fkey.json").exists());
        assert!(!dir.path().join("../evil").exists());
    }

    #[test]
    fn test_similar_keys_stay_separate() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        let keys = ["a.b", "a_b", "a/b", "a b", "a%2Fb"];
        for (i, key) in keys.iter().enumerate() {
            storage.save(key, &i.to_string()).unwrap();
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(storage.load(key).unwrap(), Some(i.to_string()), "key {}", key);
        }

        storage.remove("a_b").unwrap();
        assert_eq!(storage.load("a.b").unwrap().as_deref(), Some("0"));
        assert_eq!(storage.load("a_b").unwrap(), None);
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        fs::create_dir(dir.path().join("trishul_ui_state_browser.json")).unwrap();

        let result = storage.load("trishul_ui_state_browser");
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
