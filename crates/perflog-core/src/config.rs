//! Configuration for the performance logger

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Max completed sessions kept in the store
    pub max_sessions: usize,

    /// Max estimated size of the store in bytes
    pub max_size_bytes: usize,

    /// Durations above this (seconds) are rejected as implausible
    pub max_operation_secs: f64,

    /// App version stamped into device snapshots
    pub app_version: String,

    /// JSONL file backing the store; in-memory when unset
    pub storage_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_sessions: 50,
            max_size_bytes: 2 * 1024 * 1024,
            max_operation_secs: 3600.0,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            storage_path: None,
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Load from a JSON file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.max_sessions, 50);
        assert_eq!(config.max_size_bytes, 2 * 1024 * 1024);
        assert_eq!(config.max_operation_secs, 3600.0);
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("config.json")).unwrap();
        assert_eq!(config.max_sessions, 50);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"max_sessions": 10, "unknown_key": true}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_sessions, 10);
        assert_eq!(config.max_operation_secs, 3600.0);
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
