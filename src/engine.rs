//! The playback engine: a single control sequence that owns every state
//! transition, fed by commands and by results from background work.

mod machine;
mod player;
mod thread;
mod types;

pub use machine::{Engine, EngineParts};
pub use player::EnginePlayer;
pub use types::*;
