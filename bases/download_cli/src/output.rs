// bases/download_cli/src/output.rs
use download_orchestrator::VideoSummary;
use std::io::Write;
use std::path::Path;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy)]
pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_fetch_start(&self, url: &str) {
        println!("Fetching video information for: {}", url);
    }

    pub fn print_summary(&self, summary: &VideoSummary) {
        println!("Video Title: {}", summary.title);
        println!("Channel: {}", summary.author);
        println!("Length: {} seconds", summary.duration_secs);

        if self.verbose {
            println!("Views: {}", summary.view_count);
            println!("Thumbnail: {}", summary.thumbnail);
        }
    }

    pub fn print_summary_failed(&self) {
        println!("Failed to fetch video information.");
    }

    pub fn print_status(&self, message: &str) {
        // Start a fresh line in case a progress bar is being drawn
        eprint!("\r\x1b[K");
        println!("{}", message);
    }

    pub fn print_progress(&self, fraction: f32) {
        eprint!("\r{}", progress_bar(fraction));
        let _ = std::io::stderr().flush();
    }

    pub fn print_download_complete(&self, path: &Path) {
        eprintln!();
        println!("Download completed: {}", path.display());
    }

    pub fn print_download_failed(&self) {
        eprintln!();
        println!("Download failed.");
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}

fn progress_bar(fraction: f32) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f32).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        (fraction * 100.0).round() as u32
    )
}
