//! Persistence gateway: a small key/value store for playback state that
//! survives process restarts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// Everything the engine persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    /// Last scanned directory. Opaque to the engine.
    pub last_directory: Option<String>,
    /// Active (possibly shuffled) order.
    pub playlist: Vec<PathBuf>,
    /// Order as loaded, so shuffle can be switched off after a restart.
    pub canonical_playlist: Vec<PathBuf>,
    pub current_index: usize,
    pub position_ms: u64,
    pub shuffle: bool,
}

/// One key/value write.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEntry {
    LastDirectory(String),
    Playlist(Vec<PathBuf>),
    CanonicalPlaylist(Vec<PathBuf>),
    CurrentIndex(usize),
    PositionMs(u64),
    Shuffle(bool),
}

impl SavedState {
    fn apply(&mut self, entry: StateEntry) {
        match entry {
            StateEntry::LastDirectory(d) => self.last_directory = Some(d),
            StateEntry::Playlist(p) => self.playlist = p,
            StateEntry::CanonicalPlaylist(p) => self.canonical_playlist = p,
            StateEntry::CurrentIndex(i) => self.current_index = i,
            StateEntry::PositionMs(ms) => self.position_ms = ms,
            StateEntry::Shuffle(s) => self.shuffle = s,
        }
    }
}

pub trait StateStore: Send {
    fn load(&self) -> SavedState;
    fn set(&mut self, entry: StateEntry) -> Result<(), StoreError>;
}

/// Write `entry`, logging instead of failing. Persistence is best effort.
pub fn save(store: &mut dyn StateStore, entry: StateEntry) {
    if let Err(e) = store.set(entry) {
        warn!("failed to persist playback state: {e}");
    }
}

/// State kept in a TOML file, rewritten on every change.
pub struct TomlFileStore {
    path: PathBuf,
    state: SavedState,
}

impl TomlFileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match read_state(&path) {
            Ok(Some(state)) => state,
            Ok(None) => SavedState::default(),
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable state file: {e}");
                SavedState::default()
            }
        };
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = toml::to_string(&self.state)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_state(path: &Path) -> Result<Option<SavedState>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl StateStore for TomlFileStore {
    fn load(&self) -> SavedState {
        self.state.clone()
    }

    fn set(&mut self, entry: StateEntry) -> Result<(), StoreError> {
        self.state.apply(entry);
        self.flush()
    }
}

/// In-memory store. Clones share state, so a test can keep one clone and
/// hand the other to the engine.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<SavedState>>,
}

impl MemoryStore {
    pub fn with_state(state: SavedState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> SavedState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn set(&mut self, entry: StateEntry) -> Result<(), StoreError> {
        if let Ok(mut s) = self.state.lock() {
            s.apply(entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
