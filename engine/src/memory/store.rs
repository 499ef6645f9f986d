//! Session state persistence.
//!
//! One pretty-printed JSON document per session. Reads never fail the caller:
//! a missing, unreadable or malformed file yields a fresh empty state. Writes
//! are full snapshots, written to a sibling temp file and renamed into place.

use sdk::errors::EngineError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::state::{PersistedState, SessionState};
use super::types::now_timestamp;

/// Owns the location of the session file and the history capacity used on load
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    capacity: usize,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted state, or an empty one if there is nothing usable.
    pub fn load(&self) -> SessionState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no saved session, starting fresh");
                return SessionState::new(self.capacity);
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read saved session, starting fresh"
                );
                return SessionState::new(self.capacity);
            }
        };

        match serde_json::from_str::<PersistedState>(&contents) {
            Ok(persisted) => {
                let state = SessionState::from_persisted(persisted, self.capacity);
                tracing::info!(
                    path = %self.path.display(),
                    turns = state.history().len(),
                    likes = state.likes().len(),
                    dislikes = state.dislikes().len(),
                    summaries = state.summaries().len(),
                    "loaded saved session"
                );
                state
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "saved session is malformed, starting fresh"
                );
                SessionState::new(self.capacity)
            }
        }
    }

    /// Stamp `state.last_updated` and overwrite the session file with it.
    ///
    /// # Errors
    /// `EngineError::Persistence` if the directory, temp file or rename fails.
    pub fn save(&self, state: &mut SessionState) -> Result<(), EngineError> {
        state.set_last_updated(now_timestamp());

        let json = serde_json::to_string_pretty(&state.to_persisted())
            .map_err(|e| self.persistence_error(e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.persistence_error(e))?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.persistence_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.persistence_error(e)
        })?;

        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Delete the session file. Returns whether there was one to delete.
    pub fn reset(&self) -> Result<bool, EngineError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.persistence_error(e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, err: impl std::fmt::Display) -> EngineError {
        EngineError::Persistence {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
