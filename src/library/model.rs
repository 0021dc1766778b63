use std::path::Path;
use std::sync::Arc;

/// Embedded cover art as extracted from a file's tags.
///
/// Owned by the engine behind an `Arc`; a new track gets a new value, the old
/// one is dropped rather than edited.
#[derive(Debug, PartialEq, Eq)]
pub struct CoverArt {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// Display bundle for the selected track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_art: Option<Arc<CoverArt>>,
    /// Known once the decoder has prepared the file.
    pub duration_ms: Option<u64>,
}

impl TrackInfo {
    /// Placeholder shown until real metadata arrives: the filename without
    /// its extension and nothing else.
    pub fn fallback(path: &Path) -> Self {
        Self {
            title: fallback_title(path),
            ..Self::default()
        }
    }
}

pub fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("UNKNOWN")
        .to_string()
}
