//! Configuration management
//!
//! Storage backend selection, HTTP server binding and the thresholds used
//! when generating improvement suggestions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where learning data is persisted
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP API binding
    #[serde(default)]
    pub server: ServerConfig,
    /// Suggestion thresholds
    #[serde(default)]
    pub learning: LearningConfig,
}

/// Persistence backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per collection
    #[default]
    Json,
    /// Single SQLite database
    Sqlite,
    /// Nothing is written to disk
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory (json) or database file (sqlite); defaults to the data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Patterns below this confidence are reported
    #[serde(default = "default_low_confidence")]
    pub low_confidence_threshold: f64,
    /// Categories whose mean satisfaction is below this are reported
    #[serde(default = "default_low_satisfaction")]
    pub low_satisfaction_threshold: f64,
    /// Mean response time (ms) above which a warning is emitted
    #[serde(default = "default_slow_response")]
    pub slow_response_ms: f64,
}

fn default_low_confidence() -> f64 {
    0.6
}

fn default_low_satisfaction() -> f64 {
    3.0
}

fn default_slow_response() -> f64 {
    5000.0
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: default_low_confidence(),
            low_satisfaction_threshold: default_low_satisfaction(),
            slow_response_ms: default_slow_response(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "fin-assistant", "fin-assistant")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "fin-assistant", "fin-assistant")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", crate::info());
    println!();
    println!("Configuration ({})", config_path().map(|p| p.display().to_string()).unwrap_or_default());
    println!("==============");
    println!("Storage backend:     {}", config.storage.backend);
    match &config.storage.path {
        Some(path) => println!("Storage path:        {}", path.display()),
        None => println!("Storage path:        {} (default)", data_dir()?.display()),
    }
    println!("Server:              {}:{}", config.server.host, config.server.port);
    println!("Low confidence:      {:.2}", config.learning.low_confidence_threshold);
    println!("Low satisfaction:    {:.1}", config.learning.low_satisfaction_threshold);
    println!("Slow response (ms):  {:.0}", config.learning.slow_response_ms);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.learning.low_confidence_threshold, 0.6);
        assert_eq!(config.learning.slow_response_ms, 5000.0);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nbackend = \"sqlite\"\n\n[learning]\nslow_response_ms = 2500.0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.learning.slow_response_ms, 2500.0);
        assert_eq!(config.learning.low_confidence_threshold, 0.6);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "storage = 12").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
