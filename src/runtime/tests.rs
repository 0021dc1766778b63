use super::console::parse_command;
use super::event_loop::{Interruptions, engine_cmd_for, status_line};
use super::startup::{StartupPlan, plan_startup};
use crate::config::LibrarySettings;
use crate::engine::{EngineCmd, EngineSnapshot, Phase};
use crate::focus::{FocusClient, FocusHost, FocusKind, SharedFocus};
use crate::mpris::ControlCmd;
use crate::store::{MemoryStore, SavedState, StateStore};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[test]
fn parses_console_commands() {
    assert_eq!(parse_command("play"), Ok(ControlCmd::Play));
    assert_eq!(parse_command("  Toggle "), Ok(ControlCmd::PlayPause));
    assert_eq!(parse_command("prev"), Ok(ControlCmd::Prev));
    assert_eq!(parse_command("goto 3"), Ok(ControlCmd::PlayAt(2)));
    assert_eq!(parse_command("seek 12.5"), Ok(ControlCmd::SeekTo(12_500)));
    assert_eq!(parse_command("seek +10"), Ok(ControlCmd::SeekBy(10_000)));
    assert_eq!(parse_command("seek -4"), Ok(ControlCmd::SeekBy(-4_000)));
    assert_eq!(parse_command("shuffle on"), Ok(ControlCmd::Shuffle(true)));
    assert_eq!(parse_command("shuffle off"), Ok(ControlCmd::Shuffle(false)));
    assert_eq!(parse_command("quit"), Ok(ControlCmd::Quit));
}

#[test]
fn rejects_bad_console_input() {
    for line in ["", "goto 0", "goto x", "seek", "seek abc", "shuffle maybe", "play now", "dance"] {
        assert!(parse_command(line).is_err(), "accepted `{line}`");
    }
}

fn snapshot() -> EngineSnapshot {
    EngineSnapshot {
        playlist: vec![PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")],
        index: Some(1),
        phase: Phase::Playing,
        playing: true,
        position_ms: 5_000,
        duration_ms: Some(65_000),
        title: "Song".to_string(),
        artist: Some("Band".to_string()),
        ..EngineSnapshot::default()
    }
}

#[test]
fn relative_seek_is_clamped_to_track() {
    let s = snapshot();
    assert_eq!(
        engine_cmd_for(&ControlCmd::SeekBy(-10_000), &s),
        Some(EngineCmd::SeekTo(0))
    );
    assert_eq!(
        engine_cmd_for(&ControlCmd::SeekBy(3_000), &s),
        Some(EngineCmd::SeekTo(8_000))
    );
    assert_eq!(
        engine_cmd_for(&ControlCmd::SeekBy(600_000), &s),
        Some(EngineCmd::SeekTo(65_000))
    );
}

#[test]
fn transport_commands_map_to_engine_commands() {
    let s = snapshot();
    assert_eq!(engine_cmd_for(&ControlCmd::PlayPause, &s), Some(EngineCmd::TogglePause));
    assert_eq!(engine_cmd_for(&ControlCmd::Stop, &s), Some(EngineCmd::Pause));
    assert_eq!(engine_cmd_for(&ControlCmd::Prev, &s), Some(EngineCmd::Previous));
    assert_eq!(engine_cmd_for(&ControlCmd::PlayAt(4), &s), Some(EngineCmd::PlayAt(4)));
    assert_eq!(
        engine_cmd_for(&ControlCmd::Shuffle(true), &s),
        Some(EngineCmd::SetShuffle(true))
    );
    assert_eq!(engine_cmd_for(&ControlCmd::Quit, &s), None);
    assert_eq!(engine_cmd_for(&ControlCmd::Status, &s), None);
}

#[test]
fn status_line_shows_position_and_track() {
    assert_eq!(status_line(&snapshot()), "[playing] 2/2 Band - Song 0:05/1:05");
    assert_eq!(status_line(&EngineSnapshot::default()), "[idle] no track");
}

#[test]
fn interruptions_take_and_return_focus() {
    let focus = SharedFocus::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let mut player: FocusClient = focus.client(FocusKind::Gain, move |c| {
        log.lock().unwrap().push(c);
    });
    assert!(player.request());

    let mut interruptions = Interruptions::new(&focus);
    assert!(interruptions.toggle_transient());
    assert!(player.is_holder());
    assert_ne!(focus.holder(), Some(player.id()));
    assert!(!interruptions.toggle_transient());
    assert_eq!(focus.holder(), Some(player.id()));
    assert_eq!(seen.lock().unwrap().len(), 2);

    focus.set_blocked(true);
    assert!(!interruptions.toggle_duck());
}

#[test]
fn resumes_when_directory_matches_last_one() {
    let dir = tempdir().unwrap();
    let key = dir.path().display().to_string();
    let mut store = MemoryStore::with_state(SavedState {
        last_directory: Some(key),
        playlist: vec![PathBuf::from("/m/a.mp3")],
        ..SavedState::default()
    });
    let plan = plan_startup(Some(dir.path()), &mut store, &LibrarySettings::default());
    assert_eq!(plan, StartupPlan::Resume);
}

#[test]
fn new_directory_is_scanned_and_remembered() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.mp3"), b"").unwrap();
    fs::write(dir.path().join("a.flac"), b"").unwrap();
    fs::write(dir.path().join("notes.txt"), b"").unwrap();

    let mut store = MemoryStore::with_state(SavedState {
        last_directory: Some("/somewhere/else".to_string()),
        playlist: vec![PathBuf::from("/somewhere/else/x.mp3")],
        ..SavedState::default()
    });
    let plan = plan_startup(Some(dir.path()), &mut store, &LibrarySettings::default());
    assert_eq!(
        plan,
        StartupPlan::Load(vec![dir.path().join("a.flac"), dir.path().join("b.mp3")])
    );
    assert_eq!(
        store.load().last_directory,
        Some(dir.path().display().to_string())
    );
}

#[test]
fn empty_directory_and_no_saved_playlist_does_nothing() {
    let dir = tempdir().unwrap();
    let mut store = MemoryStore::default();
    assert_eq!(
        plan_startup(Some(dir.path()), &mut store, &LibrarySettings::default()),
        StartupPlan::Nothing
    );
    assert_eq!(
        plan_startup(None, &mut MemoryStore::default(), &LibrarySettings::default()),
        StartupPlan::Nothing
    );
}
