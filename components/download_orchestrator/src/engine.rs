// components/download_orchestrator/src/engine.rs
use std::path::PathBuf;

use crate::metadata::MediaInfo;
use crate::types::{ByteTotal, Cancelled, EngineError, FormatSelection};

/// Receives transfer progress from an engine while a download runs.
pub trait ProgressHook {
    /// Called on every progress tick. An `Err` asks the engine to stop the
    /// transfer and return [`EngineError::Cancelled`].
    fn on_progress(&mut self, downloaded: u64, total: ByteTotal) -> Result<(), Cancelled>;

    /// Called once the payload is fully transferred, before post-processing.
    fn on_finished(&mut self);
}

/// Everything an engine needs to fetch one file.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format: FormatSelection,
    /// Output template, e.g. `/videos/%(title)s.%(ext)s`
    pub output_template: String,
    /// Directory the template resolves into
    pub destination: PathBuf,
    /// Whether this is the generic fallback request
    pub fallback: bool,
}

/// External media-extraction engine.
pub trait Engine: Send + Sync {
    /// Fetch metadata without retrieving the payload.
    fn extract_info(&self, url: &str) -> Result<MediaInfo, EngineError>;

    /// Fetch the payload described by `request`, reporting to `hook`.
    fn download(
        &self,
        request: &DownloadRequest,
        hook: &mut dyn ProgressHook,
    ) -> Result<MediaInfo, EngineError>;
}
