//! JSON file store - one `<key>.json` file per key under a base directory

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use super::KeyValueStore;

/// Flat-file store
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Create the store, creating `base_dir` if needed
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create storage directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.file_path(key);
        // Write a sibling file, then rename over the old blob
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!("Saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
