//! Persistence for the signed-in session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the only place session state survives between runs. It is
//! written by login, logout, and by editing the signed-in admin's own
//! profile; everything else only reads it.

#[cfg(test)]
#[path = "session_store_test.rs"]
mod session_store_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use forms::{PersistedSession, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// Reading, writing, or removing the session file failed.
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session file exists but is not valid session JSON.
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save/clear seam for session persistence.
pub trait SessionStore: Send + Sync {
    /// Current session; `Anonymous` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be read.
    fn load(&self) -> Result<SessionState, SessionStoreError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError>;

    /// Remove every stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be removed.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// JSON file in the [`PersistedSession`] layout.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io { path: self.path.clone(), source }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionState, SessionStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionState::Anonymous),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(SessionState::Anonymous);
        }
        let stored: PersistedSession = serde_json::from_str(&raw)
            .map_err(|source| SessionStoreError::Corrupt { path: self.path.clone(), source })?;
        Ok(stored.into())
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_vec_pretty(&PersistedSession::from(state))
            .map_err(|source| SessionStoreError::Corrupt { path: self.path.clone(), source })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-process store for tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already signed-in state.
    #[must_use]
    pub fn with_state(state: &SessionState) -> Self {
        Self { inner: Mutex::new(Some(PersistedSession::from(state))) }
    }

    /// Raw persisted layout, if anything is stored.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionState, SessionStoreError> {
        Ok(self.snapshot().map(SessionState::from).unwrap_or_default())
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(PersistedSession::from(state));
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}
