//! Key-value storage for the learning engine
//!
//! Provides:
//! - The `KeyValueStore` abstraction the engine persists through
//! - An in-memory store for tests and throwaway sessions
//! - A JSON file store (one file per key)
//! - A SQLite store with a single key/value table
//! - The persistence adapter that (de)serializes the four learning collections

pub mod file;
pub mod persistence;
pub mod sqlite;

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use file::JsonFileStore;
pub use persistence::{LearningState, Persistence, PersistenceError};
pub use sqlite::SqliteStore;

use crate::config::{StorageBackend, StorageConfig};

/// A string-keyed blob store
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Value stored under `key`, or `None` if the key was never written
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store backed by a `HashMap`
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the store selected by `config`, rooted at `data_dir` unless the
/// config names an explicit path
pub fn open_store(config: &StorageConfig, data_dir: &Path) -> Result<Box<dyn KeyValueStore>> {
    let store: Box<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Json => {
            let dir = config.path.clone().unwrap_or_else(|| data_dir.join("learning"));
            Box::new(JsonFileStore::new(dir)?)
        }
        StorageBackend::Sqlite => {
            let path: PathBuf = config.path.clone().unwrap_or_else(|| data_dir.join("learning.db"));
            Box::new(SqliteStore::open(path)?)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());

        store.save("key", "[1,2,3]").unwrap();
        store.save("key", "[4]").unwrap();
        assert_eq!(store.load("key").unwrap().as_deref(), Some("[4]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_store_backends() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [StorageBackend::Memory, StorageBackend::Json, StorageBackend::Sqlite] {
            let config = StorageConfig { backend, path: None };
            let mut store = open_store(&config, dir.path()).unwrap();
            store.save("probe", "{}").unwrap();
            assert_eq!(store.load("probe").unwrap().as_deref(), Some("{}"));
        }

        assert!(dir.path().join("learning").join("probe.json").exists());
        assert!(dir.path().join("learning.db").exists());
    }
}
