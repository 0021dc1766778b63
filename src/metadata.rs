//! Background tag and cover-art extraction.
//!
//! Extraction runs on its own worker thread so a slow file never delays
//! audio start. Results are posted back to the engine tagged with the ticket
//! they were requested for; the engine drops any that arrive late.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use lofty::prelude::*;
use tracing::{debug, warn};

use crate::engine::{EngineInput, Ticket};
use crate::library::{CoverArt, TrackInfo};

pub trait MetadataSource: Send {
    fn request(&mut self, ticket: Ticket, path: &Path);
}

struct Request {
    ticket: Ticket,
    path: PathBuf,
}

/// Single worker that always works on the newest request.
pub struct MetadataFetcher {
    tx: Option<Sender<Request>>,
    join: Option<JoinHandle<()>>,
}

impl MetadataFetcher {
    pub fn spawn(reply: Sender<EngineInput>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Request>();
        let join = thread::Builder::new()
            .name("metadata".to_string())
            .spawn(move || run_worker(rx, reply))?;
        Ok(Self {
            tx: Some(tx),
            join: Some(join),
        })
    }
}

impl MetadataSource for MetadataFetcher {
    fn request(&mut self, ticket: Ticket, path: &Path) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let req = Request {
            ticket,
            path: path.to_path_buf(),
        };
        if tx.send(req).is_err() {
            warn!("metadata worker is gone; keeping fallback track info");
        }
    }
}

impl Drop for MetadataFetcher {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.tx.take();
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

fn run_worker(rx: Receiver<Request>, reply: Sender<EngineInput>) {
    while let Ok(first) = rx.recv() {
        let req = latest(first, &rx);
        let info = read_track_info(&req.path);
        if reply
            .send(EngineInput::Metadata {
                ticket: req.ticket,
                info,
            })
            .is_err()
        {
            break;
        }
    }
    debug!("metadata worker stopped");
}

/// Skip every queued request but the newest.
fn latest(mut req: Request, rx: &Receiver<Request>) -> Request {
    while let Ok(newer) = rx.try_recv() {
        debug!(skipped = %req.path.display(), "metadata request superseded");
        req = newer;
    }
    req
}

/// Read title/artist/album/cover art/duration from `path`. Anything missing
/// or unreadable falls back to the filename-derived title.
pub fn read_track_info(path: &Path) -> TrackInfo {
    let mut info = TrackInfo::fallback(path);

    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), "failed to read tags: {e}");
            return info;
        }
    };

    let duration = tagged.properties().duration();
    if !duration.is_zero() {
        info.duration_ms = Some(duration.as_millis() as u64);
    }

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return info;
    };

    if let Some(v) = tag.title().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        info.title = v;
    }
    info.artist = tag
        .artist()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    info.album = tag
        .album()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    info.cover_art = tag.pictures().first().map(|p| {
        Arc::new(CoverArt {
            mime_type: p.mime_type().map(|m| m.as_str().to_string()),
            data: p.data().to_vec(),
        })
    });

    info
}

#[cfg(test)]
mod tests;
