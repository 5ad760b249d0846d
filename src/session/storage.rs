use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::types::{Session, SessionId};
use crate::deferred_eprintln;

const STORE_VERSION: u32 = 1;

/// Get the default session store path (~/.config/phom-score/sessions.json)
pub fn get_store_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("sessions.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default = "first_id")]
    next_id: SessionId,
    #[serde(default)]
    sessions: BTreeMap<SessionId, Session>,
}

fn first_id() -> SessionId {
    1
}

impl StoreFile {
    fn new() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: first_id(),
            sessions: BTreeMap::new(),
        }
    }
}

/// All sessions, backed by one JSON file.
///
/// The in-memory copy is authoritative. Every mutation flushes to disk; a
/// failed flush is reported as a deferred warning and not retried.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    state: StoreFile,
}

impl SessionStore {
    /// Load the store from disk.
    ///
    /// If the file doesn't exist, returns an empty store bound to that path.
    /// If the file exists but has an unsupported version, returns an error.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                state: StoreFile::new(),
            });
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open session store at {}", path.display()))?;

        let mut state: StoreFile = serde_json::from_reader(file)
            .with_context(|| format!("Failed to load session store at {}", path.display()))?;

        if state.version != STORE_VERSION {
            anyhow::bail!("Unsupported session store version: {}", state.version);
        }

        for session in state.sessions.values_mut() {
            session.normalize();
        }
        // Never hand out an id that is already taken
        if let Some(&highest) = state.sessions.keys().next_back() {
            state.next_id = state.next_id.max(highest + 1);
        }

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the store to disk atomically.
    ///
    /// Uses atomic-write-file so the file is never left half-written.
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        let mut file = AtomicWriteFile::open(&self.path).with_context(|| {
            format!("Failed to open atomic write file at {}", self.path.display())
        })?;

        serde_json::to_writer_pretty(&mut file, &self.state)
            .context("Failed to serialize session store")?;

        file.commit().context("Failed to save session store")?;

        Ok(())
    }

    /// Save, reporting failure as a deferred warning instead of an error.
    /// Returns true if the write succeeded.
    pub fn flush(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                deferred_eprintln!(
                    "Could not save sessions to {} (changes kept in memory): {:#}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }

    /// Create a new session with one blank round and flush
    pub fn create_session(&mut self, name: String, player_names: [String; 4]) -> SessionId {
        let id = self.state.next_id;
        self.state.next_id += 1;
        self.state
            .sessions
            .insert(id, Session::new(id, name, player_names));
        self.flush();
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.state.sessions.get(&id)
    }

    /// All sessions ordered by id
    pub fn list(&self) -> impl Iterator<Item = &Session> {
        self.state.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.state.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.sessions.is_empty()
    }

    /// Run a mutation against a copy of the session and store the copy by id.
    ///
    /// If `f` fails the stored session is left untouched. The store is flushed
    /// only when the session actually changed.
    pub fn update<T, F>(&mut self, id: SessionId, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let current = self
            .state
            .sessions
            .get(&id)
            .with_context(|| format!("No session with id {}", id))?;

        let mut session = current.clone();
        let output = f(&mut session)?;

        if session != *current {
            self.state.sessions.insert(id, session);
            self.flush();
        }
        Ok(output)
    }

    /// Remove a session and flush. Sessions are only ever removed here.
    pub fn delete_session(&mut self, id: SessionId) -> Result<Session> {
        let removed = self
            .state
            .sessions
            .remove(&id)
            .with_context(|| format!("No session with id {}", id))?;
        self.flush();
        Ok(removed)
    }
}
