// bases/download_cli/src/args.rs
use clap::Parser;
use download_orchestrator::Quality;
use std::path::PathBuf;

/// Download a video at a chosen quality
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL or identifier
    pub url: String,

    /// Directory to store downloaded files
    #[arg(short, long, default_value = "./downloads")]
    pub output_dir: PathBuf,

    /// Highest, 1080p, 720p, 480p, 360p or "Audio Only"
    #[arg(short, long, default_value = "720p")]
    pub quality: Quality,

    /// Only fetch and print video information
    #[arg(long)]
    pub info_only: bool,

    /// Path to the yt-dlp binary (looked up on PATH by default)
    #[arg(long = "yt-dlp", value_name = "PATH")]
    pub yt_dlp: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
