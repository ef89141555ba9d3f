// components/download_orchestrator/src/metadata.rs
use serde::{Deserialize, Serialize};

/// Record returned by the engine for a single video.
///
/// Every field is optional; engines omit whatever they could not resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub uploader: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub view_count: Option<u64>,
    /// Container extension of the produced file
    pub ext: Option<String>,
    /// Final location of the produced file, when the engine reports it
    pub filepath: Option<String>,
}

/// Snapshot of a video's metadata shown to the user before downloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub author: String,
    /// Duration in seconds
    pub duration_secs: u64,
    pub thumbnail: String,
    pub view_count: u64,
}

impl From<MediaInfo> for VideoSummary {
    fn from(info: MediaInfo) -> Self {
        Self {
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            author: info.uploader.unwrap_or_else(|| "Unknown Author".to_string()),
            duration_secs: info
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d as u64)
                .unwrap_or(0),
            thumbnail: info.thumbnail.unwrap_or_default(),
            view_count: info.view_count.unwrap_or(0),
        }
    }
}
