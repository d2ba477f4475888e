//! Mirror of the last saved session's preferences and location.
//!
//! Lives in a small JSON file next to the database so callers can read the
//! user's settings without touching SQLite.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use buckled_core::{Location, Preferences, UserSessionData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    pub preferences: Preferences,
    pub location: Location,
}

pub struct SessionCache {
    path: PathBuf,
    inner: RwLock<Option<CachedSession>>,
}

impl SessionCache {
    /// Load the mirror from disk. A missing or unreadable file yields an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let cached = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok());
        Self {
            path,
            inner: RwLock::new(cached),
        }
    }

    pub fn get(&self) -> Option<CachedSession> {
        self.inner.read().clone()
    }

    /// Replace the mirror with the session's settings. Write failures are
    /// logged; the in-memory copy is always updated.
    pub fn store(&self, session: &UserSessionData) {
        let cached = CachedSession {
            preferences: session.preferences.clone(),
            location: session.location.clone(),
        };
        match serde_json::to_string_pretty(&cached) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&self.path, data) {
                    warn!("Failed to write session cache {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Failed to encode session cache: {}", e),
        }
        *self.inner.write() = Some(cached);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove session cache {}: {}", self.path.display(), e);
            }
        }
    }
}
