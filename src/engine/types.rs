//! Engine command, input and state types.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::decoder::DecoderHandle;
use crate::error::DecodeError;
use crate::events::Action;
use crate::focus::FocusChange;
use crate::library::{CoverArt, TrackInfo};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No playlist, or nothing selected.
    #[default]
    Idle,
    /// The decoder is loading the track at this index.
    Preparing(usize),
    Playing,
    Paused,
}

/// Tags background work with the selection it was issued for.
///
/// `serial` changes on every track change, so a result is current only if
/// its serial matches the engine's. `index` is the playlist position at
/// issue time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub index: usize,
    pub serial: u64,
}

/// Commands accepted from a UI or from media-button intents.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCmd {
    Play,
    Pause,
    TogglePause,
    Next,
    Previous,
    PlayAt(usize),
    SeekTo(u64),
    SetPlaylist { tracks: Vec<PathBuf>, start: usize },
    SetShuffle(bool),
    Shutdown,
}

/// Everything the engine's control sequence consumes: caller commands and
/// results funneled back from background work.
pub enum EngineInput {
    Command(EngineCmd),
    Prepared {
        ticket: Ticket,
        result: Result<Box<dyn DecoderHandle>, DecodeError>,
    },
    Metadata {
        ticket: Ticket,
        info: TrackInfo,
    },
    Focus(FocusChange),
}

/// Transient per-process playback state.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    pub phase: Phase,
    /// Last known position; only moves forward while playing.
    pub position_ms: u64,
    /// A prepare is in flight and will ask for focus when it completes.
    pub pending_focus_request: bool,
    pub last_user_action: Option<Action>,
}

/// Read-only view of the engine published after every input.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    pub playlist: Vec<PathBuf>,
    pub index: Option<usize>,
    pub phase: Phase,
    pub playing: bool,
    pub shuffle: bool,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_art: Option<Arc<CoverArt>>,
}

impl EngineSnapshot {
    pub fn current_path(&self) -> Option<&PathBuf> {
        self.index.and_then(|i| self.playlist.get(i))
    }
}

pub type SnapshotHandle = Arc<Mutex<EngineSnapshot>>;
