use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::LibrarySettings;
use crate::engine::{EngineCmd, EnginePlayer};
use crate::error::EngineError;
use crate::library::scan;
use crate::store::{self, StateEntry, StateStore};

/// What to do with the engine once it is up.
#[derive(Debug, PartialEq)]
pub enum StartupPlan {
    /// Keep the playlist the engine restored from the store.
    Resume,
    /// Replace it with a freshly scanned directory.
    Load(Vec<PathBuf>),
    Nothing,
}

/// Resume when `dir` is the directory we played last (or no directory was
/// given); otherwise scan `dir` and remember it.
pub fn plan_startup(
    dir: Option<&Path>,
    state: &mut dyn StateStore,
    library: &LibrarySettings,
) -> StartupPlan {
    let saved = state.load();
    let resumable = !saved.playlist.is_empty();

    let Some(dir) = dir else {
        if resumable {
            return StartupPlan::Resume;
        }
        warn!("no directory given and nothing to resume");
        return StartupPlan::Nothing;
    };

    let key = dir.display().to_string();
    if resumable && saved.last_directory.as_deref() == Some(key.as_str()) {
        info!(dir = %key, "resuming saved playlist");
        return StartupPlan::Resume;
    }

    let tracks = scan(dir, library);
    info!(dir = %key, tracks = tracks.len(), "scanned music directory");
    store::save(state, StateEntry::LastDirectory(key));
    if tracks.is_empty() {
        warn!(dir = %dir.display(), "no audio files found");
        return StartupPlan::Nothing;
    }
    StartupPlan::Load(tracks)
}

pub fn apply_startup(
    player: &EnginePlayer,
    plan: StartupPlan,
    autoplay: bool,
) -> Result<(), EngineError> {
    match plan {
        StartupPlan::Load(tracks) => player.send(EngineCmd::SetPlaylist { tracks, start: 0 }),
        StartupPlan::Resume if autoplay => player.send(EngineCmd::Play),
        StartupPlan::Resume | StartupPlan::Nothing => Ok(()),
    }
}
