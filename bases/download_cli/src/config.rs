// bases/download_cli/src/config.rs
use crate::args::Args;
use download_orchestrator::{EngineConfig, Quality};
use std::path::PathBuf;

/// What to download and how
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub output_dir: PathBuf,
    pub quality: Quality,
    pub info_only: bool,
    pub verbose: bool,
    pub engine: EngineConfig,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: Args) -> Self {
        let mut engine = EngineConfig::default();
        if let Some(binary) = args.yt_dlp {
            engine.binary = binary;
        }

        Self {
            url: args.url.trim().to_string(),
            output_dir: args.output_dir,
            quality: args.quality,
            info_only: args.info_only,
            verbose: args.verbose,
            engine,
        }
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    fn parse(argv: &[&str]) -> Config {
        Config::from_args(Args::try_parse_from(argv).unwrap())
    }

    #[test]
    fn defaults() {
        let config = parse(&["download-cli", "https://youtu.be/abcdEFGH12Q"]);
        assert_eq!(config.output_dir, PathBuf::from("./downloads"));
        assert_eq!(config.quality, Quality::P720);
        assert!(!config.info_only);
        assert_eq!(config.engine.binary, PathBuf::from("yt-dlp"));
        assert_eq!(config.log_filter(), "warn");
    }

    #[rstest]
    #[case("Highest", Quality::Highest)]
    #[case("1080p", Quality::P1080)]
    #[case("Audio Only", Quality::AudioOnly)]
    #[case("audio", Quality::AudioOnly)]
    fn quality_flag(#[case] label: &str, #[case] expected: Quality) {
        let config = parse(&["download-cli", "-q", label, "x"]);
        assert_eq!(config.quality, expected);
    }

    #[test]
    fn rejects_unknown_quality() {
        assert!(Args::try_parse_from(["download-cli", "-q", "4k", "x"]).is_err());
    }

    #[test]
    fn overrides() {
        let config = parse(&[
            "download-cli",
            "--yt-dlp",
            "/opt/bin/yt-dlp",
            "-o",
            "/tmp/videos",
            "--info-only",
            "-v",
            "  https://youtu.be/abcdEFGH12Q  ",
        ]);
        assert_eq!(config.engine.binary, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/videos"));
        assert!(config.info_only);
        assert_eq!(config.url, "https://youtu.be/abcdEFGH12Q");
        assert_eq!(config.log_filter(), "debug");
    }
}
