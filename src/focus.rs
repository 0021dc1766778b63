//! Audio focus arbitration.
//!
//! The arbiter is the engine's view of the exclusive output resource: it
//! asks the host for focus before playback starts and turns the host's
//! interruption signals into pause/resume/duck decisions.

mod host;

pub use host::{FocusClient, FocusHost, FocusKind, SharedFocus};

use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusState {
    None,
    Held,
    HeldButDucked,
    LostTransient,
}

/// Focus changes reported by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    /// Another client took focus for good.
    Loss,
    /// Another client needs focus briefly and will hand it back.
    LossTransient,
    /// Another client plays briefly on top of us; we may keep playing quietly.
    LossTransientCanDuck,
}

/// What the engine should do in response to a focus change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusDecision {
    Pause,
    Resume,
    Duck,
    /// Back to full volume.
    Restore,
    Ignore,
}

pub struct FocusArbiter {
    host: Box<dyn FocusHost>,
    state: FocusState,
    resume_on_gain: bool,
    released: bool,
}

impl FocusArbiter {
    pub fn new(host: Box<dyn FocusHost>) -> Self {
        Self {
            host,
            state: FocusState::None,
            resume_on_gain: false,
            released: false,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn holds_focus(&self) -> bool {
        matches!(self.state, FocusState::Held | FocusState::HeldButDucked)
    }

    /// Ask for focus. A grant we already hold is reused rather than
    /// requested again.
    pub fn request(&mut self) -> bool {
        if self.released {
            return false;
        }
        if self.holds_focus() {
            return true;
        }
        if self.host.request() {
            self.state = FocusState::Held;
            true
        } else {
            info!("audio focus denied");
            false
        }
    }

    pub fn on_change(&mut self, change: FocusChange, playing: bool) -> FocusDecision {
        debug!(?change, playing, state = ?self.state, "focus change");
        match change {
            FocusChange::Gain => {
                let was_ducked = self.state == FocusState::HeldButDucked;
                self.state = FocusState::Held;
                if self.resume_on_gain {
                    self.resume_on_gain = false;
                    FocusDecision::Resume
                } else if was_ducked {
                    FocusDecision::Restore
                } else {
                    FocusDecision::Ignore
                }
            }
            FocusChange::Loss => {
                self.state = FocusState::None;
                self.resume_on_gain = false;
                FocusDecision::Pause
            }
            FocusChange::LossTransient => {
                self.state = FocusState::LostTransient;
                if playing {
                    self.resume_on_gain = true;
                    FocusDecision::Pause
                } else {
                    FocusDecision::Ignore
                }
            }
            FocusChange::LossTransientCanDuck => {
                self.state = FocusState::HeldButDucked;
                FocusDecision::Duck
            }
        }
    }

    /// Give focus back to the host. Only the first call has any effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.host.abandon();
        self.state = FocusState::None;
        self.resume_on_gain = false;
    }
}

#[cfg(test)]
mod tests;
