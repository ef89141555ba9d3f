// components/download_orchestrator/src/types.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by an extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Required dependency not found: {0}")]
    NotFound(&'static str),

    #[error("No video information available")]
    Unavailable,

    #[error("{0}")]
    FormatUnavailable(String),

    #[error("Download cancelled by user")]
    Cancelled,

    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid engine output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stop condition raised by a progress hook to abort the running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Download cancelled by user")]
pub struct Cancelled;

impl From<Cancelled> for EngineError {
    fn from(_: Cancelled) -> Self {
        EngineError::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown quality: {0}")]
pub struct UnknownQuality(pub String);

/// Size of the transfer as far as the engine knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteTotal {
    Exact(u64),
    Estimated(u64),
    Unknown,
}

/// Quality presets offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Highest,
    P1080,
    P720,
    P480,
    P360,
    AudioOnly,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Highest,
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
        Quality::AudioOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quality::Highest => "Highest",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::AudioOnly => "Audio Only",
        }
    }

    /// Maximum vertical resolution, if the preset caps it
    pub fn height(self) -> Option<u32> {
        match self {
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::Highest | Quality::AudioOnly => None,
        }
    }

    /// Engine format selection for this preset
    pub fn format_selection(self) -> FormatSelection {
        match self {
            Quality::AudioOnly => FormatSelection {
                expression: "bestaudio".to_string(),
                extract_audio: Some(AudioExtraction::default()),
            },
            Quality::Highest => FormatSelection::plain("bestvideo+bestaudio/best"),
            capped => {
                let h = capped.height().unwrap_or_default();
                FormatSelection::plain(format!(
                    "bestvideo[height<={h}]+bestaudio/best[height<={h}]"
                ))
            }
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("audio") {
            return Ok(Quality::AudioOnly);
        }
        Quality::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}

/// Transcoding step applied after an audio-only download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: String,
    pub bitrate_kbps: u32,
}

impl Default for AudioExtraction {
    fn default() -> Self {
        Self {
            codec: "mp3".to_string(),
            bitrate_kbps: 192,
        }
    }
}

/// Format expression handed to the engine, plus optional audio extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    pub expression: String,
    pub extract_audio: Option<AudioExtraction>,
}

impl FormatSelection {
    pub fn plain(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            extract_audio: None,
        }
    }

    /// Most compatible single-file format, used when the preferred one fails
    pub fn generic() -> Self {
        Self::plain("best")
    }
}

/// One engine invocation in the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub format: FormatSelection,
    pub fallback: bool,
}

/// Ordered attempts for a download: the quality-specific request, then the generic one.
pub fn attempt_plan(quality: Quality) -> Vec<Attempt> {
    vec![
        Attempt {
            format: quality.format_selection(),
            fallback: false,
        },
        Attempt {
            format: FormatSelection::generic(),
            fallback: true,
        },
    ]
}
