use std::sync::mpsc::Receiver;

use tracing::{debug, info};

use crate::engine::{EngineCmd, EnginePlayer, EngineSnapshot, Phase};
use crate::focus::{FocusClient, FocusHost, FocusKind, SharedFocus};
use crate::mpris::ControlCmd;

/// Stand-ins for other applications competing for audio focus.
pub struct Interruptions {
    transient: FocusClient,
    duck: FocusClient,
    transient_active: bool,
    duck_active: bool,
}

impl Interruptions {
    pub fn new(focus: &SharedFocus) -> Self {
        Self {
            transient: focus.client(FocusKind::Transient, |change| {
                debug!(?change, "interrupting client focus change");
            }),
            duck: focus.client(FocusKind::TransientMayDuck, |change| {
                debug!(?change, "ducking client focus change");
            }),
            transient_active: false,
            duck_active: false,
        }
    }

    pub fn toggle_transient(&mut self) -> bool {
        toggle(&mut self.transient, &mut self.transient_active, "interruption")
    }

    pub fn toggle_duck(&mut self) -> bool {
        toggle(&mut self.duck, &mut self.duck_active, "duckable interruption")
    }
}

fn toggle(client: &mut FocusClient, active: &mut bool, what: &str) -> bool {
    if *active {
        client.abandon();
        *active = false;
        info!("{what} ended");
    } else if client.request() {
        *active = true;
        info!("{what} started");
    } else {
        info!("{what} refused by focus stack");
    }
    *active
}

/// Translate an outside command into an engine command. Commands handled by
/// the loop itself map to `None`.
pub fn engine_cmd_for(cmd: &ControlCmd, snapshot: &EngineSnapshot) -> Option<EngineCmd> {
    let engine_cmd = match *cmd {
        ControlCmd::Play => EngineCmd::Play,
        ControlCmd::Pause | ControlCmd::Stop => EngineCmd::Pause,
        ControlCmd::PlayPause => EngineCmd::TogglePause,
        ControlCmd::Next => EngineCmd::Next,
        ControlCmd::Prev => EngineCmd::Previous,
        ControlCmd::SeekBy(delta) => {
            let target = snapshot.position_ms.saturating_add_signed(delta);
            let target = match snapshot.duration_ms {
                Some(d) => target.min(d),
                None => target,
            };
            EngineCmd::SeekTo(target)
        }
        ControlCmd::SeekTo(ms) => EngineCmd::SeekTo(ms),
        ControlCmd::PlayAt(index) => EngineCmd::PlayAt(index),
        ControlCmd::Shuffle(on) => EngineCmd::SetShuffle(on),
        ControlCmd::Quit | ControlCmd::Status | ControlCmd::Interrupt | ControlCmd::Duck => {
            return None;
        }
    };
    Some(engine_cmd)
}

/// One-line summary for the `status` command.
pub fn status_line(s: &EngineSnapshot) -> String {
    let state = match s.phase {
        Phase::Idle => "idle",
        Phase::Preparing(_) => "loading",
        Phase::Playing => "playing",
        Phase::Paused => "paused",
    };
    let Some(index) = s.index else {
        return format!("[{state}] no track");
    };
    let who = match s.artist.as_deref() {
        Some(artist) => format!("{artist} - {}", s.title),
        None => s.title.clone(),
    };
    let duration = s
        .duration_ms
        .map(|d| format!("/{}", clock(d)))
        .unwrap_or_default();
    format!(
        "[{state}] {}/{} {who} {}{duration}{}",
        index + 1,
        s.playlist.len(),
        clock(s.position_ms),
        if s.shuffle { " (shuffle)" } else { "" }
    )
}

fn clock(ms: u64) -> String {
    let secs = ms / 1_000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Apply outside commands until `Quit` arrives or every sender is gone.
pub fn run(
    player: &EnginePlayer,
    focus: &SharedFocus,
    control_rx: &Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut interruptions = Interruptions::new(focus);

    while let Ok(cmd) = control_rx.recv() {
        debug!(?cmd, "control command");
        match cmd {
            ControlCmd::Quit => break,
            ControlCmd::Status => println!("{}", status_line(&player.snapshot())),
            ControlCmd::Interrupt => {
                interruptions.toggle_transient();
            }
            ControlCmd::Duck => {
                interruptions.toggle_duck();
            }
            other => {
                if let Some(engine_cmd) = engine_cmd_for(&other, &player.snapshot()) {
                    player.send(engine_cmd)?;
                }
            }
        }
    }

    Ok(())
}
