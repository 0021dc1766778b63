//! Events the engine emits for a presentation layer (notification,
//! lock-screen session, UI list).
//!
//! Sinks are called on the engine thread, in the order state changes
//! happen, and must not block.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tracing::{info, warn};

use crate::library::TrackInfo;

/// User-visible commands reported through `action_performed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Play,
    Pause,
    Next,
    Previous,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Play => "Play",
            Action::Pause => "Pause",
            Action::Next => "Next",
            Action::Previous => "Previous",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdleReason {
    /// A full pass over the playlist found no playable track.
    NothingPlayable,
}

pub trait EventSink: Send {
    fn track_changed(&mut self, _index: usize) {}
    fn play_state_changed(&mut self, _playing: bool) {}
    fn playlist_changed(&mut self, _order: &[PathBuf], _index: usize) {}
    /// Fired once a user-visible command has settled. `info` carries the
    /// title, artist and cover art to show alongside the label.
    fn action_performed(&mut self, _action: Action, _info: &TrackInfo) {}
    /// Metadata for the selected track was patched in.
    fn track_info_changed(&mut self, _index: usize, _info: &TrackInfo) {}
    fn went_idle(&mut self, _reason: IdleReason) {}
}

/// Owned form of every callback, for sinks that forward across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TrackChanged(usize),
    PlayStateChanged(bool),
    PlaylistChanged { order: Vec<PathBuf>, index: usize },
    ActionPerformed { action: Action, info: TrackInfo },
    TrackInfoChanged { index: usize, info: TrackInfo },
    WentIdle(IdleReason),
}

/// Forwards every event onto a channel. A closed receiver is ignored.
pub struct ChannelEvents {
    tx: Sender<EngineEvent>,
}

impl ChannelEvents {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl EventSink for ChannelEvents {
    fn track_changed(&mut self, index: usize) {
        self.send(EngineEvent::TrackChanged(index));
    }

    fn play_state_changed(&mut self, playing: bool) {
        self.send(EngineEvent::PlayStateChanged(playing));
    }

    fn playlist_changed(&mut self, order: &[PathBuf], index: usize) {
        self.send(EngineEvent::PlaylistChanged {
            order: order.to_vec(),
            index,
        });
    }

    fn action_performed(&mut self, action: Action, info: &TrackInfo) {
        self.send(EngineEvent::ActionPerformed {
            action,
            info: info.clone(),
        });
    }

    fn track_info_changed(&mut self, index: usize, info: &TrackInfo) {
        self.send(EngineEvent::TrackInfoChanged {
            index,
            info: info.clone(),
        });
    }

    fn went_idle(&mut self, reason: IdleReason) {
        self.send(EngineEvent::WentIdle(reason));
    }
}

/// Reports events through `tracing`; the console "notification".
pub struct LogEvents;

impl EventSink for LogEvents {
    fn track_changed(&mut self, index: usize) {
        info!(index, "track changed");
    }

    fn play_state_changed(&mut self, playing: bool) {
        info!(playing, "play state changed");
    }

    fn playlist_changed(&mut self, order: &[PathBuf], index: usize) {
        info!(len = order.len(), index, "playlist changed");
    }

    fn action_performed(&mut self, action: Action, info: &TrackInfo) {
        match info.artist.as_deref() {
            Some(artist) => info!("{}: {} - {}", action.label(), artist, info.title),
            None => info!("{}: {}", action.label(), info.title),
        }
    }

    fn track_info_changed(&mut self, index: usize, info: &TrackInfo) {
        info!(
            index,
            title = %info.title,
            artist = info.artist.as_deref().unwrap_or(""),
            album = info.album.as_deref().unwrap_or(""),
            cover_art = info.cover_art.is_some(),
            "now playing"
        );
    }

    fn went_idle(&mut self, reason: IdleReason) {
        warn!(?reason, "engine idle: nothing playable");
    }
}

impl EventSink for Vec<Box<dyn EventSink>> {
    fn track_changed(&mut self, index: usize) {
        self.iter_mut().for_each(|s| s.track_changed(index));
    }

    fn play_state_changed(&mut self, playing: bool) {
        self.iter_mut().for_each(|s| s.play_state_changed(playing));
    }

    fn playlist_changed(&mut self, order: &[PathBuf], index: usize) {
        self.iter_mut().for_each(|s| s.playlist_changed(order, index));
    }

    fn action_performed(&mut self, action: Action, info: &TrackInfo) {
        self.iter_mut().for_each(|s| s.action_performed(action, info));
    }

    fn track_info_changed(&mut self, index: usize, info: &TrackInfo) {
        self.iter_mut().for_each(|s| s.track_info_changed(index, info));
    }

    fn went_idle(&mut self, reason: IdleReason) {
        self.iter_mut().for_each(|s| s.went_idle(reason));
    }
}
