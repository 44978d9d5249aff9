//! Path resolution for stored performance logs

use std::path::{Path, PathBuf};

/// Resolves standard paths for perflog files
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    /// Resolve `~/.perflog`, or `$PERFLOG_HOME` when set
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os("PERFLOG_HOME") {
            return Ok(Self::with_root(dir));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::with_root(home.join(".perflog")))
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get sessions.jsonl path
    pub fn sessions_file(&self) -> PathBuf {
        self.root.join("sessions.jsonl")
    }

    /// Get config.json path
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }
}
