//! File-backed session store (`~/.homedash/session.json`).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{Session, SessionProvider};
use crate::error::{DashboardError, Result};
use crate::settings::homedash_dir;

/// Default location of the persisted session.
pub fn session_path() -> PathBuf {
    homedash_dir().join("session.json")
}

/// Persists the session as JSON and caches it in memory, so reads on every
/// poll tick never touch the disk.
pub struct FileSessionStore {
    path: PathBuf,
    cached: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Open the store at the default location.
    pub fn open_default() -> Self {
        Self::open(session_path())
    }

    /// Open the store at `path`. A missing or unreadable file means logged out.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = Self::read_file(&path);
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Option<Session> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read session file {:?}: {}", path, e);
                None
            }
        }
    }
}

impl SessionProvider for FileSessionStore {
    fn get_session(&self) -> Option<Session> {
        self.cached.read().clone()
    }

    fn store_session(&self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, serde_json::to_string_pretty(&session)?)?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            DashboardError::SessionStore(format!("failed to replace {:?}: {}", self.path, e))
        })?;

        tracing::debug!("Stored session for {}", session.display_name);
        *self.cached.write() = Some(session);
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        *self.cached.write() = None;
        Ok(())
    }
}
