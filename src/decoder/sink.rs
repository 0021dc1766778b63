//! `rodio`-backed decoder.
//!
//! Opening and probing a file happens on a short-lived worker thread; the
//! result is a paused `Sink` positioned at the requested offset, handed back
//! to the engine through its inbox.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder as FileDecoder, Sink, Source};
use tracing::{debug, warn};

use crate::engine::{EngineInput, Ticket};
use crate::error::DecodeError;

use super::{Decoder, DecoderHandle};

pub struct RodioDecoder {
    mixer: Mixer,
    reply: Sender<EngineInput>,
}

impl RodioDecoder {
    pub fn new(mixer: Mixer, reply: Sender<EngineInput>) -> Self {
        Self { mixer, reply }
    }
}

impl Decoder for RodioDecoder {
    fn prepare(&mut self, ticket: Ticket, path: &Path, start_ms: u64) {
        let mixer = self.mixer.clone();
        let reply = self.reply.clone();
        let owned = path.to_path_buf();

        let spawned = thread::Builder::new()
            .name("prepare".to_string())
            .spawn(move || {
                let result = open_sink_at(&mixer, &owned, Duration::from_millis(start_ms))
                    .map(|h| Box::new(h) as Box<dyn DecoderHandle>);
                let _ = reply.send(EngineInput::Prepared { ticket, result });
            });

        if let Err(source) = spawned {
            warn!("failed to spawn prepare worker: {source}");
            let _ = self.reply.send(EngineInput::Prepared {
                ticket,
                result: Err(DecodeError::Open {
                    path: path.to_path_buf(),
                    source,
                }),
            });
        }
    }
}

/// Open `path` and build a paused `Sink` that starts at `start_at`.
fn open_sink_at(
    mixer: &Mixer,
    path: &Path,
    start_at: Duration,
) -> Result<RodioHandle, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let source = FileDecoder::new(BufReader::new(file)).map_err(|e| DecodeError::Unsupported {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let duration = source.total_duration();

    let sink = Sink::connect_new(mixer);
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    sink.append(source.skip_duration(start_at));
    sink.pause();
    debug!(path = %path.display(), ?duration, ?start_at, "track prepared");

    Ok(RodioHandle {
        sink,
        duration,
        offset: start_at,
    })
}

struct RodioHandle {
    sink: Sink,
    duration: Option<Duration>,
    /// Skipped at open time; the sink's clock does not include it.
    offset: Duration,
}

impl DecoderHandle for RodioHandle {
    fn start(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position_ms: u64) {
        // Seeks are absolute in the underlying file, and the sink's clock
        // follows them, so the skipped prefix no longer needs adding.
        match self.sink.try_seek(Duration::from_millis(position_ms)) {
            Ok(()) => self.offset = Duration::ZERO,
            Err(e) => warn!(error = ?e, position_ms, "seek failed"),
        }
    }

    fn position_ms(&self) -> u64 {
        (self.offset + self.sink.get_pos()).as_millis() as u64
    }

    fn duration_ms(&self) -> Option<u64> {
        self.duration.map(|d| d.as_millis() as u64)
    }

    fn is_started(&self) -> bool {
        !self.sink.is_paused()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn release(&mut self) {
        self.sink.stop();
    }
}
