use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub state: StateSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How often the playing position is written to the state file (milliseconds).
    pub save_interval_ms: u64,
    /// `previous` restarts the current track instead of changing tracks once
    /// playback is past this point (milliseconds).
    pub restart_threshold_ms: u64,
    /// Control-loop cadence for end-of-track detection and timers (milliseconds).
    pub tick_ms: u64,
    /// Output volume while another client holds duckable focus (0.0 - 1.0).
    pub duck_volume: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            save_interval_ms: 5_000,
            restart_threshold_ms: 3_000,
            tick_ms: 200,
            duck_volume: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "ogg".into(), "wav".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Resume the persisted track at its saved position on startup.
    pub autoplay: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Where playback state is persisted. Defaults to the XDG state directory.
    pub path: Option<PathBuf>,
}
