//! Process-wide focus stack shared by every client that wants to play audio.

use std::sync::{Arc, Mutex, MutexGuard};

use super::FocusChange;

/// The host side of audio focus as seen by one client.
pub trait FocusHost: Send {
    /// Ask for focus; `false` means playback must not start.
    fn request(&mut self) -> bool;
    /// Drop any focus this client holds.
    fn abandon(&mut self);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusKind {
    /// Long-lived playback; evicts every other holder.
    Gain,
    /// Short interruption; the previous holder pauses and gets focus back.
    Transient,
    /// Short interruption the previous holder may play under at low volume.
    TransientMayDuck,
}

type Listener = Arc<dyn Fn(FocusChange) + Send + Sync>;

struct Holder {
    id: u64,
    kind: FocusKind,
    listener: Listener,
}

#[derive(Default)]
struct FocusStack {
    next_id: u64,
    holders: Vec<Holder>,
    blocked: bool,
}

/// Arbitrates focus between clients of one process. Cheap to clone; clones
/// share the same stack.
#[derive(Clone, Default)]
pub struct SharedFocus {
    inner: Arc<Mutex<FocusStack>>,
}

impl SharedFocus {
    fn lock(&self) -> MutexGuard<'_, FocusStack> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new client. `listener` is told about focus taken from or
    /// handed back to this client; it runs on whichever thread caused the
    /// change and must not block.
    pub fn client(
        &self,
        kind: FocusKind,
        listener: impl Fn(FocusChange) + Send + Sync + 'static,
    ) -> FocusClient {
        let id = {
            let mut stack = self.lock();
            stack.next_id += 1;
            stack.next_id
        };
        FocusClient {
            id,
            kind,
            shared: self.clone(),
            listener: Arc::new(listener),
        }
    }

    /// While blocked every request is denied, like a host in a phone call.
    pub fn set_blocked(&self, blocked: bool) {
        self.lock().blocked = blocked;
    }

    /// Id of the client currently on top of the stack.
    pub fn holder(&self) -> Option<u64> {
        self.lock().holders.last().map(|h| h.id)
    }
}

pub struct FocusClient {
    id: u64,
    kind: FocusKind,
    shared: SharedFocus,
    listener: Listener,
}

impl FocusClient {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_holder(&self) -> bool {
        self.shared.lock().holders.iter().any(|h| h.id == self.id)
    }
}

impl FocusHost for FocusClient {
    fn request(&mut self) -> bool {
        let notify: Vec<(Listener, FocusChange)> = {
            let mut stack = self.shared.lock();
            if stack.blocked {
                return false;
            }
            if stack.holders.last().is_some_and(|h| h.id == self.id) {
                return true;
            }
            stack.holders.retain(|h| h.id != self.id);

            let notify: Vec<(Listener, FocusChange)> = match self.kind {
                FocusKind::Gain => stack
                    .holders
                    .drain(..)
                    .map(|h| (h.listener, FocusChange::Loss))
                    .collect(),
                FocusKind::Transient => stack
                    .holders
                    .last()
                    .map(|h| (h.listener.clone(), FocusChange::LossTransient))
                    .into_iter()
                    .collect(),
                FocusKind::TransientMayDuck => stack
                    .holders
                    .last()
                    .map(|h| (h.listener.clone(), FocusChange::LossTransientCanDuck))
                    .into_iter()
                    .collect(),
            };
            stack.holders.push(Holder {
                id: self.id,
                kind: self.kind,
                listener: self.listener.clone(),
            });
            notify
        };

        for (listener, change) in notify {
            listener(change);
        }
        true
    }

    fn abandon(&mut self) {
        let regained: Option<Listener> = {
            let mut stack = self.shared.lock();
            let Some(pos) = stack.holders.iter().position(|h| h.id == self.id) else {
                return;
            };
            let was_top = pos + 1 == stack.holders.len();
            let holder = stack.holders.remove(pos);
            if was_top && holder.kind != FocusKind::Gain {
                stack.holders.last().map(|h| h.listener.clone())
            } else {
                None
            }
        };

        if let Some(listener) = regained {
            listener(FocusChange::Gain);
        }
    }
}
