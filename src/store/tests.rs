use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_starts_with_defaults() {
    let dir = tempdir().unwrap();
    let store = TomlFileStore::open(dir.path().join("state.toml"));
    assert_eq!(store.load(), SavedState::default());
}

#[test]
fn writes_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.toml");

    let mut store = TomlFileStore::open(&path);
    store
        .set(StateEntry::Playlist(vec![
            PathBuf::from("/m/b.mp3"),
            PathBuf::from("/m/a.mp3"),
        ]))
        .unwrap();
    store
        .set(StateEntry::CanonicalPlaylist(vec![
            PathBuf::from("/m/a.mp3"),
            PathBuf::from("/m/b.mp3"),
        ]))
        .unwrap();
    store.set(StateEntry::CurrentIndex(1)).unwrap();
    store.set(StateEntry::PositionMs(73_250)).unwrap();
    store.set(StateEntry::Shuffle(true)).unwrap();
    store
        .set(StateEntry::LastDirectory("/m".to_string()))
        .unwrap();

    let reopened = TomlFileStore::open(&path).load();
    assert_eq!(reopened.playlist[0], PathBuf::from("/m/b.mp3"));
    assert_eq!(reopened.canonical_playlist[0], PathBuf::from("/m/a.mp3"));
    assert_eq!(reopened.current_index, 1);
    assert_eq!(reopened.position_ms, 73_250);
    assert!(reopened.shuffle);
    assert_eq!(reopened.last_directory.as_deref(), Some("/m"));
    assert!(!path.with_extension("toml.tmp").exists());
}

#[test]
fn corrupt_file_is_ignored_and_overwritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.toml");
    fs::write(&path, "current_index = \"not a number\"\n[[[").unwrap();

    let mut store = TomlFileStore::open(&path);
    assert_eq!(store.load(), SavedState::default());

    store.set(StateEntry::CurrentIndex(4)).unwrap();
    assert_eq!(TomlFileStore::open(&path).load().current_index, 4);
}

#[test]
fn partial_file_fills_missing_keys_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.toml");
    fs::write(&path, "position_ms = 1200\n").unwrap();

    let state = TomlFileStore::open(&path).load();
    assert_eq!(state.position_ms, 1200);
    assert!(state.playlist.is_empty());
    assert!(!state.shuffle);
}

#[test]
fn memory_store_clones_share_state() {
    let store = MemoryStore::default();
    let mut writer = store.clone();
    save(&mut writer, StateEntry::PositionMs(9));
    assert_eq!(store.load().position_ms, 9);
}
