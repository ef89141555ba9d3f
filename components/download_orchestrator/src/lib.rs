// components/download_orchestrator/src/lib.rs
mod engine;
mod metadata;
mod organization;
mod session;
mod types;
mod utils;
mod ytdlp;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

pub use engine::{DownloadRequest, Engine, ProgressHook};
pub use metadata::{MediaInfo, VideoSummary};
pub use session::{CancelHandle, ProgressCallback, StatusCallback};
pub use types::{
    attempt_plan, Attempt, AudioExtraction, ByteTotal, Cancelled, EngineError, FormatSelection,
    Quality, UnknownQuality,
};
pub use utils::{normalize, video_id};
pub use ytdlp::{EngineConfig, YtDlp};

use organization::{output_template, resolve_output_path};
use session::{Session, StatusChannel, CANCELLED_MESSAGE};

const INFO_UNAVAILABLE_MESSAGE: &str =
    "Could not retrieve video information. The video might be private or region-restricted.";

/// Fetches video metadata and downloads videos through an extraction engine.
///
/// Calls block; run them off the UI thread. Only one `download` may run per
/// instance at a time, while [`Orchestrator::cancel`] may be called from any
/// thread during it.
pub struct Orchestrator {
    engine: Arc<dyn Engine>,
    progress: Option<ProgressCallback>,
    status: Arc<StatusChannel>,
    cancelled: Arc<AtomicBool>,
    last_summary: Mutex<Option<VideoSummary>>,
}

impl Orchestrator {
    /// Create an orchestrator backed by yt-dlp, checking that it is installed
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let engine = YtDlp::new(config);
        let binary = engine.check_available()?;
        tracing::info!(binary = %binary.display(), "Using yt-dlp");
        Ok(Self::with_engine(Arc::new(engine)))
    }

    /// Create an orchestrator with a specific engine implementation
    pub fn with_engine(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            progress: None,
            status: Arc::new(StatusChannel::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
            last_summary: Mutex::new(None),
        }
    }

    /// Receive download progress as a fraction in `[0.0, 1.0]`
    pub fn on_progress(mut self, callback: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Receive human-readable status messages; repeats are dropped.
    ///
    /// Cancel handles taken earlier report through the new callback too.
    pub fn on_status(self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.status.set_callback(Arc::new(callback));
        self
    }

    /// Handle for cancelling downloads from another thread or task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancelled), Arc::clone(&self.status))
    }

    /// Stop the running download at its next progress tick.
    ///
    /// Safe to call from another thread; a download started afterwards is not affected.
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// Summary produced by the most recent successful [`Orchestrator::fetch_summary`]
    pub fn last_summary(&self) -> Option<VideoSummary> {
        self.last_summary.lock().clone()
    }

    /// Look up a video's metadata without downloading it.
    ///
    /// Failures are reported on the status channel and yield `None`.
    pub fn fetch_summary(&self, locator: &str) -> Option<VideoSummary> {
        let url = normalize(locator);
        tracing::info!(%url, "Fetching video information");

        match self.engine.extract_info(&url) {
            Ok(info) => {
                let summary = VideoSummary::from(info);
                *self.last_summary.lock() = Some(summary.clone());
                Some(summary)
            }
            Err(EngineError::Unavailable) => {
                self.status.send(INFO_UNAVAILABLE_MESSAGE);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Metadata lookup failed");
                self.status.send(&format!("Error fetching video info: {}", e));
                None
            }
        }
    }

    /// Download a video at the given quality into `destination`.
    ///
    /// Returns the absolute path of the produced file. When the requested
    /// quality fails, a generic format is tried before giving up; failure
    /// details only go to the status channel.
    pub fn download(
        &self,
        locator: &str,
        quality: Quality,
        destination: impl AsRef<Path>,
    ) -> Option<PathBuf> {
        let mut session = Session::begin(&self.cancelled, self.progress.as_ref(), &self.status);
        let url = normalize(locator);
        tracing::info!(%url, %quality, "Starting download session");

        let destination = match prepare_destination(destination.as_ref()) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "Could not prepare destination");
                session.status(&format!("Error during download: {}", e));
                return None;
            }
        };

        for attempt in attempt_plan(quality) {
            if session.is_cancelled() {
                tracing::info!(fallback = attempt.fallback, "Skipping attempt after cancellation");
                return None;
            }

            if attempt.fallback {
                session.status("Attempting fallback download with basic settings...");
            } else {
                session.status(&format!("Starting download with quality: {}", quality));
            }
            session.reset_percent();

            let request = DownloadRequest {
                url: url.clone(),
                output_template: output_template(&destination),
                destination: destination.clone(),
                format: attempt.format.clone(),
                fallback: attempt.fallback,
            };

            match self.engine.download(&request, &mut session) {
                Ok(info) => {
                    let codec = attempt.format.extract_audio.as_ref().map(|a| a.codec.as_str());
                    let path = resolve_output_path(&destination, &info, codec);
                    tracing::info!(path = %path.display(), "Download complete");
                    return Some(path);
                }
                Err(EngineError::Cancelled) => {
                    tracing::info!("Download cancelled");
                    session.status(CANCELLED_MESSAGE);
                    return None;
                }
                Err(e) if attempt.fallback => {
                    tracing::warn!(error = %e, "Fallback download failed");
                    session.status(&format!("Fallback download failed: {}", e));
                }
                Err(EngineError::FormatUnavailable(detail)) => {
                    tracing::warn!(%detail, "Requested format unavailable");
                    session.status(
                        "The requested quality is not available. Trying with best available format...",
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Download attempt failed");
                    session.status(&format!("Download error: {}. Trying fallback method...", e));
                }
            }
        }

        None
    }
}

fn prepare_destination(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    dunce::canonicalize(dir)
}
