//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all Buckled data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Embedded database directory (`data/db/`).
    pub db: PathBuf,
    /// Uploaded service documents (`data/uploads/`).
    pub uploads: PathBuf,
    /// JSON backups written by the export command (`data/exports/`).
    pub exports: PathBuf,
    /// Collaborator configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Mirror of the session's preferences and location (`data/session-cache.json`).
    pub session_cache_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            uploads: root.join("uploads"),
            exports: root.join("exports"),
            llm_config_file: root.join("llm-config.json"),
            session_cache_file: root.join("session-cache.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db)?;
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Top-level Buckled configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuckledConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl BuckledConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let max_upload_mb: usize = std::env::var("BUCKLED_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}
