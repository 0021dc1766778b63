//! Audio library: the on-disk track model and directory scanning.
//!
//! Tracks are identified by path; their display bundle (`TrackInfo`) is
//! filled in lazily by the metadata fetcher once a track is selected.

mod model;
mod scan;

pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
