//! Error types shared across the engine and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the engine thread and its owning handle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No audio output could be opened.
    #[error("no audio output device: {0}")]
    Output(String),

    /// The engine thread has exited and no longer accepts commands.
    #[error("engine thread is not running")]
    Disconnected,

    /// Spawning a worker thread failed.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A track could not be prepared for playback.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported or corrupt audio in {path:?}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
}

/// Reading or writing persisted playback state failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode state: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to decode state: {0}")]
    Decode(#[from] toml::de::Error),
}
