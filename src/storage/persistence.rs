//! Persistence adapter
//!
//! Serializes the four learning collections as JSON blobs under fixed keys.
//! Reads never fail from the caller's point of view: a missing key yields an
//! empty collection and a failed or corrupt read is logged and treated the
//! same way.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::types::{Interaction, KnowledgeEntry, Pattern, UserPreferences};

pub const INTERACTIONS_KEY: &str = "ai_learning_interactions";
pub const PATTERNS_KEY: &str = "ai_learning_patterns";
pub const KNOWLEDGE_BASE_KEY: &str = "ai_knowledge_base";
pub const USER_PREFERENCES_KEY: &str = "ai_user_preferences";

/// Diagnostics produced while moving collections in and out of storage
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read '{key}': {message}")]
    Read { key: String, message: String },
    #[error("stored data under '{key}' is corrupt")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write '{key}': {message}")]
    Write { key: String, message: String },
}

/// The four collections as loaded from storage
#[derive(Debug, Clone, Default)]
pub struct LearningState {
    pub interactions: Vec<Interaction>,
    pub patterns: Vec<Pattern>,
    pub knowledge_base: Vec<(String, KnowledgeEntry)>,
    pub user_preferences: Vec<(String, UserPreferences)>,
}

/// JSON (de)serialization on top of a `KeyValueStore`
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load every collection, substituting empty defaults for anything
    /// missing or unreadable
    pub fn load_state(&self) -> LearningState {
        LearningState {
            interactions: self.load_or_default(INTERACTIONS_KEY),
            patterns: self.load_or_default(PATTERNS_KEY),
            knowledge_base: self.load_or_default(KNOWLEDGE_BASE_KEY),
            user_preferences: self.load_or_default(USER_PREFERENCES_KEY),
        }
    }

    /// Load one collection. `Ok(None)` means the key has never been written.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let raw = self.store.load(key).map_err(|e| PersistenceError::Read {
            key: key.to_string(),
            message: format!("{:#}", e),
        })?;

        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| PersistenceError::Corrupt { key: key.to_string(), source }),
        }
    }

    /// Serialize and store one collection
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value)
            .map_err(|source| PersistenceError::Serialize { key: key.to_string(), source })?;
        self.store.save(key, &json).map_err(|e| PersistenceError::Write {
            key: key.to_string(),
            message: format!("{:#}", e),
        })?;
        debug!("Persisted '{}' ({} bytes)", key, json.len());
        Ok(())
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Falling back to empty '{}': {}", key, e);
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, MockKeyValueStore};

    #[test]
    fn test_missing_keys_load_empty() {
        let persistence = Persistence::new(Box::new(MemoryStore::new()));
        let state = persistence.load_state();
        assert!(state.interactions.is_empty());
        assert!(state.patterns.is_empty());
        assert!(state.knowledge_base.is_empty());
        assert!(state.user_preferences.is_empty());
    }

    #[test]
    fn test_corrupt_blob_falls_back() {
        let mut store = MemoryStore::new();
        store.save(INTERACTIONS_KEY, "{not json").unwrap();
        store.save(USER_PREFERENCES_KEY, r#"[["u1",{"experienceLevel":"expert"}]]"#).unwrap();

        let persistence = Persistence::new(Box::new(store));
        assert!(matches!(
            persistence.load::<Vec<Interaction>>(INTERACTIONS_KEY),
            Err(PersistenceError::Corrupt { .. })
        ));

        let state = persistence.load_state();
        assert!(state.interactions.is_empty());
        assert_eq!(state.user_preferences.len(), 1);
        assert_eq!(state.user_preferences[0].1.experience_level.as_deref(), Some("expert"));
    }

    #[test]
    fn test_read_failure_falls_back() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_load()
            .returning(|_| Err(anyhow::anyhow!("disk unavailable")));

        let persistence = Persistence::new(Box::new(store));
        let err = persistence.load::<Vec<Pattern>>(PATTERNS_KEY).unwrap_err();
        assert!(err.to_string().contains("disk unavailable"));
        assert!(persistence.load_state().patterns.is_empty());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_save()
            .returning(|_, _| Err(anyhow::anyhow!("read-only filesystem")));

        let mut persistence = Persistence::new(Box::new(store));
        let err = persistence.save(PATTERNS_KEY, &Vec::<Pattern>::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }
}
