use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::EngineSettings;
use crate::error::EngineError;
use crate::events::EventSink;
use crate::focus::SharedFocus;
use crate::store::StateStore;

use super::thread::{ThreadArgs, spawn_engine_thread};
use super::types::{EngineCmd, EngineInput, EngineSnapshot, SnapshotHandle};

/// Owned handle to a running engine thread.
pub struct EnginePlayer {
    tx: Sender<EngineInput>,
    snapshot: SnapshotHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl EnginePlayer {
    /// Start the engine thread and wait until the audio output is open.
    pub fn spawn(
        settings: EngineSettings,
        store: Box<dyn StateStore>,
        events: Box<dyn EventSink>,
        focus: SharedFocus,
    ) -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel::<EngineInput>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(EngineSnapshot::default()));

        let args = ThreadArgs {
            settings,
            store,
            events,
            focus,
            snapshot: snapshot.clone(),
        };
        let join = spawn_engine_thread(args, tx.clone(), rx, ready_tx)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = join.join();
                return Err(e);
            }
            Err(_) => {
                let _ = join.join();
                return Err(EngineError::Disconnected);
            }
        }

        Ok(Self {
            tx,
            snapshot,
            join: Mutex::new(Some(join)),
        })
    }

    pub fn send(&self, cmd: EngineCmd) -> Result<(), EngineError> {
        self.tx
            .send(EngineInput::Command(cmd))
            .map_err(|_| EngineError::Disconnected)
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// Copy of the state published after the engine's last step.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Stop playback, persist, release the output and join the thread.
    /// Later calls return immediately.
    pub fn shutdown(&self) {
        let Ok(mut join) = self.join.lock() else {
            return;
        };
        let Some(handle) = join.take() else {
            return;
        };
        let _ = self.tx.send(EngineInput::Command(EngineCmd::Shutdown));
        let _ = handle.join();
    }
}

impl Drop for EnginePlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
