use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use tracing::{info, warn};

use crate::engine::EnginePlayer;
use crate::events::LogEvents;
use crate::focus::SharedFocus;
use crate::mpris::{self, ControlCmd};
use crate::store::{MemoryStore, StateStore, TomlFileStore};

mod console;
mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let mut store: Box<dyn StateStore> = match settings.state_path() {
        Some(path) => {
            info!(path = %path.display(), "using state file");
            Box::new(TomlFileStore::open(path))
        }
        None => {
            warn!("no state directory; playback state will not survive a restart");
            Box::new(MemoryStore::default())
        }
    };

    let dir = env::args().nth(1).map(PathBuf::from);
    let plan = startup::plan_startup(dir.as_deref(), store.as_mut(), &settings.library);

    let focus = SharedFocus::default();
    let player = EnginePlayer::spawn(
        settings.engine.clone(),
        store,
        Box::new(LogEvents),
        focus.clone(),
    )?;
    startup::apply_startup(&player, plan, settings.playback.autoplay)?;

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    mpris::spawn_mpris(control_tx.clone(), player.snapshot_handle());
    console::spawn_console(control_tx);
    eprintln!("{}", console::HELP);

    let result = event_loop::run(&player, &focus, &control_rx);
    player.shutdown();
    result
}

#[cfg(test)]
mod tests;
