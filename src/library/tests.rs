use super::*;
use crate::config::LibrarySettings;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn names(tracks: &[PathBuf]) -> Vec<String> {
    tracks
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn fallback_info_uses_file_stem_only() {
    let info = TrackInfo::fallback(Path::new("/music/Artist/01 Song.flac"));
    assert_eq!(info.title, "01 Song");
    assert_eq!(info.artist, None);
    assert_eq!(info.album, None);
    assert!(info.cover_art.is_none());
    assert_eq!(info.duration_ms, None);
}

#[test]
fn fallback_title_keeps_inner_dots() {
    assert_eq!(fallback_title(Path::new("/m/a.b.c.mp3")), "a.b.c");
    assert_eq!(fallback_title(Path::new("/")), "UNKNOWN");
}

#[test]
fn scan_filters_non_audio_and_sorts_by_path() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("a.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(names(&tracks), vec!["a.ogg", "b.MP3"]);
}

#[test]
fn scan_respects_include_hidden_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();
    let hidden_dir = dir.path().join(".stash");
    fs::create_dir_all(&hidden_dir).unwrap();
    fs::write(hidden_dir.join("inside.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);

    assert_eq!(names(&tracks), vec!["visible.mp3"]);
}

#[test]
fn scan_respects_recursive_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(names(&tracks), vec!["root.mp3"]);
}

#[test]
fn scan_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    fs::write(d1.join("one.mp3"), b"not real").unwrap();
    fs::write(d2.join("two.mp3"), b"not real").unwrap();

    // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let found = names(&scan(dir.path(), &settings));

    assert!(found.contains(&"root.mp3".to_string()));
    assert!(found.contains(&"one.mp3".to_string()));
    assert!(!found.contains(&"two.mp3".to_string()));
}

#[test]
fn scan_of_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let tracks = scan(&dir.path().join("nope"), &LibrarySettings::default());
    assert!(tracks.is_empty());
}
