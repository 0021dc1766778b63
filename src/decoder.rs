//! The decoder boundary: preparing a file for playback and controlling it
//! once it is ready.
//!
//! Decoding itself is a black box. The engine only ever asks for a track to
//! be prepared and later receives `EngineInput::Prepared` carrying either a
//! live handle or the reason the file could not be played.

mod sink;

pub use sink::RodioDecoder;

use std::path::Path;

use crate::engine::Ticket;

pub trait Decoder: Send {
    /// Start preparing `path` in the background, positioned at `start_ms`.
    /// Completion, successful or not, is reported tagged with `ticket`.
    fn prepare(&mut self, ticket: Ticket, path: &Path, start_ms: u64);
}

/// Transport controls for one prepared track.
pub trait DecoderHandle: Send {
    fn start(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position_ms: u64);
    fn position_ms(&self) -> u64;
    fn duration_ms(&self) -> Option<u64>;
    fn is_started(&self) -> bool;
    /// The track has played to its end.
    fn is_finished(&self) -> bool;
    fn set_volume(&mut self, volume: f32);
    /// Stop output and free the underlying resources.
    fn release(&mut self);
}
