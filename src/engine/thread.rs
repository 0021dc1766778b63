use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rodio::OutputStreamBuilder;
use tracing::{debug, info};

use crate::config::EngineSettings;
use crate::decoder::RodioDecoder;
use crate::error::EngineError;
use crate::events::EventSink;
use crate::focus::{FocusArbiter, FocusKind, SharedFocus};
use crate::metadata::MetadataFetcher;
use crate::store::StateStore;

use super::machine::{Engine, EngineParts};
use super::types::{EngineInput, SnapshotHandle};

/// Everything the engine thread needs, moved in at spawn.
pub(super) struct ThreadArgs {
    pub settings: EngineSettings,
    pub store: Box<dyn StateStore>,
    pub events: Box<dyn EventSink>,
    pub focus: SharedFocus,
    pub snapshot: SnapshotHandle,
}

/// Spawn the control sequence. `ready` reports whether the audio output
/// could be opened; the thread exits right away when it could not.
pub(super) fn spawn_engine_thread(
    args: ThreadArgs,
    tx: Sender<EngineInput>,
    rx: Receiver<EngineInput>,
    ready: SyncSender<Result<(), EngineError>>,
) -> Result<JoinHandle<()>, EngineError> {
    let handle = thread::Builder::new()
        .name("engine".to_string())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready.send(Err(EngineError::Output(e.to_string())));
                    return;
                }
            };
            // rodio logs to stderr when the stream is dropped; that is noise
            // on a clean shutdown.
            stream.log_on_drop(false);

            let metadata = match MetadataFetcher::spawn(tx.clone()) {
                Ok(m) => m,
                Err(e) => {
                    let _ = ready.send(Err(EngineError::Spawn(e)));
                    return;
                }
            };

            let focus_tx = tx.clone();
            let client = args.focus.client(FocusKind::Gain, move |change| {
                let _ = focus_tx.send(EngineInput::Focus(change));
            });

            let parts = EngineParts {
                decoder: Box::new(RodioDecoder::new(stream.mixer().clone(), tx.clone())),
                metadata: Box::new(metadata),
                focus: FocusArbiter::new(Box::new(client)),
                store: args.store,
                events: args.events,
                settings: args.settings,
            };
            let mut engine = Engine::new(parts, StdRng::from_os_rng());
            // Only the engine's own clones of `tx` stay alive past this point.
            drop(tx);

            publish(&engine, &args.snapshot);
            let _ = ready.send(Ok(()));

            run_loop(&mut engine, &rx, &args.snapshot);

            engine.shutdown();
            publish(&engine, &args.snapshot);
            info!("engine thread stopped");
        })?;
    Ok(handle)
}

fn run_loop(engine: &mut Engine, rx: &Receiver<EngineInput>, snapshot: &SnapshotHandle) {
    let mut next_tick = Instant::now() + engine.next_deadline();
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(input) => {
                if !engine.handle(input, Instant::now()) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("engine inbox closed");
                break;
            }
        }
        // A busy inbox must not starve end-of-track detection or saves.
        if let Some(next) = tick_if_due(engine, next_tick, Instant::now()) {
            next_tick = next;
        }
        publish(engine, snapshot);
    }
}

/// Run `tick` when `next_tick` has passed and return the following deadline.
pub(super) fn tick_if_due(engine: &mut Engine, next_tick: Instant, now: Instant) -> Option<Instant> {
    if now < next_tick {
        return None;
    }
    engine.tick(now);
    Some(now + engine.next_deadline())
}

fn publish(engine: &Engine, snapshot: &SnapshotHandle) {
    if let Ok(mut s) = snapshot.lock() {
        *s = engine.snapshot();
    }
}
