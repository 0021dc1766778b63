//! The playback state machine.
//!
//! `Engine` owns the playlist, the session, the single live decoder handle
//! and the focus arbiter. It never blocks and never spawns threads: every
//! command and every background result arrives through `handle`, and
//! `tick` drives end-of-track detection and the periodic position save.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::decoder::{Decoder, DecoderHandle};
use crate::error::DecodeError;
use crate::events::{Action, EventSink, IdleReason};
use crate::focus::{FocusArbiter, FocusChange, FocusDecision, FocusState};
use crate::library::TrackInfo;
use crate::metadata::MetadataSource;
use crate::playlist::{Direction, Playlist};
use crate::store::{self, StateEntry, StateStore};

use super::types::{EngineCmd, EngineInput, EngineSnapshot, Phase, PlaybackSession, Ticket};

/// Collaborators handed to the engine at construction.
pub struct EngineParts {
    pub decoder: Box<dyn Decoder>,
    pub metadata: Box<dyn MetadataSource>,
    pub focus: FocusArbiter,
    pub store: Box<dyn StateStore>,
    pub events: Box<dyn EventSink>,
    pub settings: EngineSettings,
}

/// The prepare currently in flight.
struct Pending {
    ticket: Ticket,
    action: Action,
}

pub struct Engine {
    playlist: Playlist,
    session: PlaybackSession,
    output: Option<Box<dyn DecoderHandle>>,
    info: TrackInfo,
    serial: u64,
    pending: Option<Pending>,
    /// Active-order indices that failed to decode since the last successful
    /// prepare or user navigation.
    failed: HashSet<usize>,
    save_due: Option<Instant>,
    now: Instant,
    shut_down: bool,

    decoder: Box<dyn Decoder>,
    metadata: Box<dyn MetadataSource>,
    focus: FocusArbiter,
    store: Box<dyn StateStore>,
    events: Box<dyn EventSink>,
    settings: EngineSettings,
}

impl Engine {
    /// Build an engine and restore the persisted playlist, index, position
    /// and shuffle flag. Nothing is prepared until the first command.
    pub fn new(parts: EngineParts, rng: StdRng) -> Self {
        let saved = parts.store.load();

        let mut playlist = Playlist::new(rng);
        playlist.restore(
            saved.canonical_playlist,
            saved.playlist,
            saved.current_index,
            saved.shuffle,
        );

        let session = PlaybackSession {
            phase: if playlist.is_empty() {
                Phase::Idle
            } else {
                Phase::Paused
            },
            position_ms: saved.position_ms,
            ..PlaybackSession::default()
        };
        let info = playlist
            .current_path()
            .map(TrackInfo::fallback)
            .unwrap_or_default();

        if !playlist.is_empty() {
            info!(
                tracks = playlist.len(),
                index = ?playlist.current_index(),
                position_ms = saved.position_ms,
                shuffle = saved.shuffle,
                "restored playlist"
            );
        }

        Self {
            playlist,
            session,
            output: None,
            info,
            serial: 0,
            pending: None,
            failed: HashSet::new(),
            save_due: None,
            now: Instant::now(),
            shut_down: false,
            decoder: parts.decoder,
            metadata: parts.metadata,
            focus: parts.focus,
            store: parts.store,
            events: parts.events,
            settings: parts.settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn track_info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn is_playing(&self) -> bool {
        self.session.phase == Phase::Playing
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Position of the current track, read live from the handle when one
    /// exists.
    pub fn position_ms(&self) -> u64 {
        match (&self.output, self.session.phase) {
            (Some(h), Phase::Playing) => h.position_ms().max(self.session.position_ms),
            _ => self.session.position_ms,
        }
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.output
            .as_ref()
            .and_then(|h| h.duration_ms())
            .or(self.info.duration_ms)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            playlist: self.playlist.tracks().to_vec(),
            index: self.playlist.current_index(),
            phase: self.session.phase,
            playing: self.is_playing(),
            shuffle: self.playlist.shuffle_enabled(),
            position_ms: self.position_ms(),
            duration_ms: self.duration_ms(),
            title: self.info.title.clone(),
            artist: self.info.artist.clone(),
            album: self.info.album.clone(),
            cover_art: self.info.cover_art.clone(),
        }
    }

    /// When `tick` next needs to run.
    pub fn next_deadline(&self) -> Duration {
        Duration::from_millis(self.settings.tick_ms.max(1))
    }

    /// Apply one input. Returns `false` once the engine has shut down.
    pub fn handle(&mut self, input: EngineInput, now: Instant) -> bool {
        self.now = now;
        if self.shut_down {
            return false;
        }
        match input {
            EngineInput::Command(cmd) => self.command(cmd),
            EngineInput::Prepared { ticket, result } => self.on_prepared(ticket, result),
            EngineInput::Metadata { ticket, info } => self.on_metadata(ticket, info),
            EngineInput::Focus(change) => self.on_focus(change),
        }
        !self.shut_down
    }

    fn command(&mut self, cmd: EngineCmd) {
        debug!(?cmd, phase = ?self.session.phase, "command");
        match cmd {
            EngineCmd::Play => self.play(),
            EngineCmd::Pause => self.pause(),
            EngineCmd::TogglePause => {
                if self.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            EngineCmd::Next => self.next(),
            EngineCmd::Previous => self.previous(),
            EngineCmd::PlayAt(index) => self.play_at(index),
            EngineCmd::SeekTo(ms) => self.seek_to(ms),
            EngineCmd::SetPlaylist { tracks, start } => self.set_playlist(tracks, start),
            EngineCmd::SetShuffle(enabled) => self.set_shuffle(enabled),
            EngineCmd::Shutdown => self.shutdown(),
        }
    }

    /// Track progress, end-of-track and the periodic save.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        if self.shut_down || self.session.phase != Phase::Playing {
            return;
        }
        let Some(handle) = self.output.as_ref() else {
            return;
        };

        let pos = handle.position_ms();
        let finished = handle.is_finished();
        if pos > self.session.position_ms {
            self.session.position_ms = pos;
        }

        if finished {
            debug!(index = ?self.playlist.current_index(), "track finished");
            self.advance(Direction::Forward, Action::Next);
            return;
        }

        if self.save_due.is_some_and(|due| now >= due) {
            self.save(StateEntry::PositionMs(self.session.position_ms));
            self.arm_save_timer();
        }
    }

    fn set_playlist(&mut self, tracks: Vec<PathBuf>, start: usize) {
        if !self.playlist.replace(tracks, start) {
            debug!("ignoring empty playlist");
            return;
        }
        let index = self.playlist.current_index().unwrap_or(0);
        info!(tracks = self.playlist.len(), index, "playlist replaced");

        self.save(StateEntry::CanonicalPlaylist(
            self.playlist.canonical().to_vec(),
        ));
        self.save(StateEntry::Playlist(self.playlist.tracks().to_vec()));
        self.save(StateEntry::CurrentIndex(index));
        self.save(StateEntry::PositionMs(0));
        self.events.playlist_changed(self.playlist.tracks(), index);

        self.failed.clear();
        self.begin_prepare(0, Action::Play);
    }

    fn play(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        match self.session.phase {
            Phase::Playing | Phase::Preparing(_) => {
                debug!("play ignored; already playing or preparing");
            }
            Phase::Idle | Phase::Paused => {
                if self.output.is_none() {
                    self.begin_prepare(self.session.position_ms, Action::Play);
                } else {
                    self.start_playback(Action::Play);
                }
            }
        }
    }

    fn pause(&mut self) {
        if self.session.phase != Phase::Playing {
            return;
        }
        self.pause_output();
        self.events.action_performed(Action::Pause, &self.info);
        self.session.last_user_action = Some(Action::Pause);
    }

    /// Stop output, persist where we are and drop to `Paused`.
    fn pause_output(&mut self) {
        if let Some(h) = self.output.as_mut() {
            h.pause();
            let pos = h.position_ms();
            if pos > self.session.position_ms {
                self.session.position_ms = pos;
            }
        }
        self.save(StateEntry::PositionMs(self.session.position_ms));
        self.save_due = None;
        self.session.phase = Phase::Paused;
        self.events.play_state_changed(false);
        info!(position_ms = self.session.position_ms, "paused");
    }

    fn next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.failed.clear();
        self.advance(Direction::Forward, Action::Next);
    }

    fn previous(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let elapsed = self
            .output
            .as_ref()
            .map(|h| h.position_ms().max(self.session.position_ms));
        if elapsed.is_some_and(|ms| ms > self.settings.restart_threshold_ms) {
            debug!(?elapsed, "previous restarts the current track");
            self.seek_to(0);
            self.events.action_performed(Action::Previous, &self.info);
            self.session.last_user_action = Some(Action::Previous);
            return;
        }
        self.failed.clear();
        self.advance(Direction::Backward, Action::Previous);
    }

    fn play_at(&mut self, index: usize) {
        if !self.playlist.select(index) {
            debug!(index, len = self.playlist.len(), "play_at out of range");
            return;
        }
        self.failed.clear();
        self.save(StateEntry::CurrentIndex(index));
        self.save(StateEntry::PositionMs(0));
        self.begin_prepare(0, Action::Play);
    }

    fn seek_to(&mut self, ms: u64) {
        let Some(h) = self.output.as_mut() else {
            return;
        };
        let target = match h.duration_ms() {
            Some(d) => ms.min(d),
            None => ms,
        };
        h.seek(target);
        self.session.position_ms = target;
    }

    fn set_shuffle(&mut self, enabled: bool) {
        self.playlist.set_shuffle(enabled);
        // Failed indices refer to the old active order.
        self.failed.clear();
        self.save(StateEntry::Shuffle(enabled));
        let Some(index) = self.playlist.current_index() else {
            return;
        };

        self.save(StateEntry::Playlist(self.playlist.tracks().to_vec()));
        self.save(StateEntry::CurrentIndex(index));
        // Same track, new position in the active order. In-flight work keeps
        // its serial and so stays current.
        if let Phase::Preparing(_) = self.session.phase {
            self.session.phase = Phase::Preparing(index);
        }
        if let Some(p) = self.pending.as_mut() {
            p.ticket.index = index;
        }
        info!(enabled, index, "shuffle changed");
        self.events.playlist_changed(self.playlist.tracks(), index);
    }

    /// Move the selection one step and prepare the new track from 0.
    fn advance(&mut self, dir: Direction, action: Action) {
        let Some(index) = self.playlist.step(dir) else {
            return;
        };
        self.save(StateEntry::CurrentIndex(index));
        self.save(StateEntry::PositionMs(0));
        self.begin_prepare(0, action);
    }

    /// Release whatever is playing and ask the decoder and the metadata
    /// fetcher for the current track.
    fn begin_prepare(&mut self, start_ms: u64, action: Action) {
        let (Some(index), Some(path)) = (
            self.playlist.current_index(),
            self.playlist.current_path().map(|p| p.to_path_buf()),
        ) else {
            return;
        };

        self.release_handle();
        self.save_due = None;
        self.serial += 1;
        let ticket = Ticket {
            index,
            serial: self.serial,
        };

        self.info = TrackInfo::fallback(&path);
        self.session.phase = Phase::Preparing(index);
        self.session.position_ms = start_ms;
        self.session.pending_focus_request = true;
        self.pending = Some(Pending { ticket, action });

        info!(index, path = %path.display(), start_ms, "preparing");
        self.decoder.prepare(ticket, &path, start_ms);
        self.metadata.request(ticket, &path);
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.serial == self.serial && self.playlist.current_index().is_some()
    }

    fn on_prepared(
        &mut self,
        ticket: Ticket,
        result: Result<Box<dyn DecoderHandle>, DecodeError>,
    ) {
        let pending = match self.pending.take() {
            Some(p) if p.ticket.serial == ticket.serial && self.is_current(ticket) => p,
            other => {
                self.pending = other;
                debug!(?ticket, serial = self.serial, "dropping stale prepare result");
                if let Ok(mut stale) = result {
                    stale.release();
                }
                return;
            }
        };
        self.session.pending_focus_request = false;

        match result {
            Ok(handle) => {
                self.failed.clear();
                self.output = Some(handle);
                self.events.track_changed(pending.ticket.index);
                self.session.phase = Phase::Paused;
                self.start_playback(pending.action);
            }
            Err(e) => {
                self.failed.insert(pending.ticket.index);
                warn!(
                    index = pending.ticket.index,
                    failed = self.failed.len(),
                    "decode failed: {e}"
                );
                self.skip_failed();
            }
        }
    }

    /// Move to a track that has not failed yet, or go idle once every track
    /// in the playlist has.
    fn skip_failed(&mut self) {
        if self.failed.len() >= self.playlist.len() {
            self.go_idle();
            return;
        }
        match self.playlist.step_avoiding(Direction::Forward, &self.failed) {
            Some(index) => {
                self.save(StateEntry::CurrentIndex(index));
                self.save(StateEntry::PositionMs(0));
                self.begin_prepare(0, Action::Next);
            }
            None => self.go_idle(),
        }
    }

    /// Ask for focus and start output. On denial the track stays paused.
    fn start_playback(&mut self, action: Action) {
        if self.output.is_none() {
            return;
        }
        if !self.focus.request() {
            self.session.phase = Phase::Paused;
            self.events.play_state_changed(false);
            return;
        }
        let position_ms = self.session.position_ms;
        let volume = self.output_volume();
        if let Some(h) = self.output.as_mut() {
            h.set_volume(volume);
            h.start();
        }
        self.session.phase = Phase::Playing;
        self.session.last_user_action = Some(action);
        self.arm_save_timer();
        info!(index = ?self.playlist.current_index(), position_ms, "playing");
        self.events.play_state_changed(true);
        self.events.action_performed(action, &self.info);
    }

    fn go_idle(&mut self) {
        warn!(tracks = self.playlist.len(), "no playable track in playlist");
        self.release_handle();
        self.serial += 1;
        self.pending = None;
        self.failed.clear();
        self.save_due = None;
        self.session.phase = Phase::Idle;
        self.session.pending_focus_request = false;
        self.session.position_ms = 0;
        self.events.went_idle(IdleReason::NothingPlayable);
    }

    fn on_metadata(&mut self, ticket: Ticket, info: TrackInfo) {
        if !self.is_current(ticket) {
            debug!(?ticket, serial = self.serial, "dropping stale metadata");
            return;
        }
        let Some(index) = self.playlist.current_index() else {
            return;
        };
        let duration_ms = self.output.as_ref().and_then(|h| h.duration_ms());
        self.info = TrackInfo {
            duration_ms: duration_ms.or(info.duration_ms),
            ..info
        };
        self.events.track_info_changed(index, &self.info);
    }

    fn on_focus(&mut self, change: FocusChange) {
        let decision = self.focus.on_change(change, self.is_playing());
        match decision {
            FocusDecision::Pause => {
                if self.is_playing() {
                    self.pause_output();
                }
            }
            FocusDecision::Resume => {
                self.set_volume(1.0);
                if self.session.phase == Phase::Paused {
                    self.start_playback(Action::Play);
                }
            }
            FocusDecision::Duck => self.set_volume(self.settings.duck_volume),
            FocusDecision::Restore => self.set_volume(1.0),
            FocusDecision::Ignore => {}
        }
    }

    /// Volume a starting handle should play at given the current focus.
    fn output_volume(&self) -> f32 {
        if self.focus.state() == FocusState::HeldButDucked {
            self.settings.duck_volume
        } else {
            1.0
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(h) = self.output.as_mut() {
            h.set_volume(volume);
        }
    }

    fn arm_save_timer(&mut self) {
        self.save_due = Some(self.now + Duration::from_millis(self.settings.save_interval_ms));
    }

    fn release_handle(&mut self) {
        if let Some(mut h) = self.output.take() {
            h.release();
        }
    }

    fn save(&mut self, entry: StateEntry) {
        store::save(self.store.as_mut(), entry);
    }

    /// Persist, then release the decoder and focus. Only the first call has
    /// any effect.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(index) = self.playlist.current_index() {
            let position_ms = self.position_ms();
            self.save(StateEntry::CurrentIndex(index));
            self.save(StateEntry::PositionMs(position_ms));
        }
        self.save_due = None;
        self.pending = None;
        self.release_handle();
        self.focus.release();
        self.info.cover_art = None;
        if self.session.phase == Phase::Playing {
            self.events.play_state_changed(false);
        }
        self.session.phase = Phase::Idle;
        info!("engine shut down");
    }
}
