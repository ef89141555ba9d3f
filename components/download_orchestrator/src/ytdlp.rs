// components/download_orchestrator/src/ytdlp.rs
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use crate::engine::{DownloadRequest, Engine, ProgressHook};
use crate::metadata::MediaInfo;
use crate::types::{ByteTotal, EngineError};

const PROGRESS_PREFIX: &str = "[progress] ";
const RESULT_PREFIX: &str = "[result] ";
const FORMAT_UNAVAILABLE: &str = "Requested format is not available";

/// Tuning for the yt-dlp process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Binary name or path; bare names are looked up on `PATH`
    pub binary: PathBuf,
    /// Retries for transient network failures
    pub retries: u32,
    /// Retries per fragment for segmented streams
    pub fragment_retries: u32,
    /// Try to get around geographic restrictions
    pub geo_bypass: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            retries: 10,
            fragment_retries: 10,
            geo_bypass: true,
        }
    }
}

/// Engine backed by the `yt-dlp` command line program.
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: EngineConfig,
}

impl YtDlp {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the configured binary, failing if it cannot be found
    pub fn check_available(&self) -> Result<PathBuf, EngineError> {
        which::which(&self.config.binary).map_err(|_| EngineError::NotFound("yt-dlp"))
    }

    fn metadata_args(url: &str) -> Vec<String> {
        [
            "--dump-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "--ignore-errors",
            url,
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec!["-f".to_string(), request.format.expression.clone()];

        if let Some(audio) = &request.format.extract_audio {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(audio.codec.clone());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", audio.bitrate_kbps));
        }

        args.extend(
            ["--no-playlist", "--quiet", "--no-warnings", "--progress", "--newline"]
                .map(String::from),
        );

        args.push("--retries".to_string());
        args.push(self.config.retries.to_string());
        if !request.fallback {
            args.push("--fragment-retries".to_string());
            args.push(self.config.fragment_retries.to_string());
            args.push("--skip-unavailable-fragments".to_string());
        }
        if self.config.geo_bypass {
            args.push("--geo-bypass".to_string());
        }

        args.push("--progress-template".to_string());
        args.push(format!(
            "download:{}%(progress.status)s %(progress.downloaded_bytes)s \
             %(progress.total_bytes)s %(progress.total_bytes_estimate)s",
            PROGRESS_PREFIX
        ));
        args.push("--print".to_string());
        args.push(format!("after_move:{}%(.{{title,ext,filepath}})j", RESULT_PREFIX));
        args.push("--no-simulate".to_string());

        args.push("-o".to_string());
        args.push(request.output_template.clone());
        args.push(request.url.clone());
        args
    }
}

impl Engine for YtDlp {
    fn extract_info(&self, url: &str) -> Result<MediaInfo, EngineError> {
        tracing::debug!(url, "Fetching metadata");

        let output = Command::new(&self.config.binary)
            .args(Self::metadata_args(url))
            .stdin(Stdio::null())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(json) = stdout.lines().find(|line| !line.trim().is_empty()) else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, stderr = %stderr.trim(), "yt-dlp returned no metadata");
            return Err(EngineError::Unavailable);
        };

        Ok(serde_json::from_str(json)?)
    }

    fn download(
        &self,
        request: &DownloadRequest,
        hook: &mut dyn ProgressHook,
    ) -> Result<MediaInfo, EngineError> {
        let args = self.download_args(request);
        tracing::info!(
            url = %request.url,
            format = %request.format.expression,
            fallback = request.fallback,
            "Starting yt-dlp"
        );

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .current_dir(&request.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Failed("yt-dlp stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Failed("yt-dlp stderr was not captured".to_string()))?;

        // Drained on its own thread so a chatty stderr cannot stall stdout.
        let stderr_reader = thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });

        let output = match read_output(stdout, hook) {
            Ok(output) => output,
            Err(e) => {
                match &e {
                    EngineError::Cancelled => tracing::info!("Stopping yt-dlp after cancellation"),
                    e => tracing::warn!(error = %e, "Lost yt-dlp output, stopping it"),
                }
                stop(child, stderr_reader);
                return Err(e);
            }
        };

        let status = child.wait()?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            tracing::warn!(%status, "yt-dlp failed");
            return Err(classify_failure(&stderr, &status.to_string()));
        }

        if !output.finished {
            hook.on_finished();
        }

        tracing::info!("yt-dlp completed");
        Ok(output.result.unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct Output {
    finished: bool,
    result: Option<MediaInfo>,
}

/// Feed yt-dlp's stdout to the hook until the stream ends
fn read_output(stdout: ChildStdout, hook: &mut dyn ProgressHook) -> Result<Output, EngineError> {
    let mut output = Output::default();

    for line in BufReader::new(stdout).lines() {
        let line = line?;
        match parse_line(&line) {
            Some(Line::Progress(tick)) if tick.status == "finished" => {
                output.finished = true;
                hook.on_finished();
            }
            Some(Line::Progress(tick)) => hook.on_progress(tick.downloaded, tick.total)?,
            Some(Line::Result(info)) => output.result = Some(info),
            None => tracing::trace!(line = %line, "yt-dlp output"),
        }
    }

    Ok(output)
}

/// Kill and reap the process, then wait for its stderr reader
fn stop(mut child: Child, stderr_reader: JoinHandle<String>) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = stderr_reader.join();
}

#[derive(Debug, PartialEq)]
struct Tick {
    status: String,
    downloaded: u64,
    total: ByteTotal,
}

#[derive(Debug, PartialEq)]
enum Line {
    Progress(Tick),
    Result(MediaInfo),
}

fn parse_line(line: &str) -> Option<Line> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return parse_progress(rest).map(Line::Progress);
    }
    if let Some(rest) = line.strip_prefix(RESULT_PREFIX) {
        return serde_json::from_str(rest).ok().map(Line::Result);
    }
    None
}

fn parse_progress(rest: &str) -> Option<Tick> {
    let mut fields = rest.split_whitespace();
    let status = fields.next()?.to_string();
    let downloaded = parse_bytes(fields.next()?);
    let total = parse_bytes(fields.next()?);
    let estimate = parse_bytes(fields.next()?);

    let total = match (total, estimate) {
        (Some(exact), _) => ByteTotal::Exact(exact),
        (None, Some(estimate)) => ByteTotal::Estimated(estimate),
        (None, None) => ByteTotal::Unknown,
    };

    Some(Tick {
        status,
        downloaded: downloaded.unwrap_or(0),
        total,
    })
}

/// yt-dlp prints `NA` for unknown values and floats for estimates
fn parse_bytes(field: &str) -> Option<u64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

fn classify_failure(stderr: &str, status: &str) -> EngineError {
    let detail = stderr
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(|line| line.trim().to_string());

    if stderr.contains(FORMAT_UNAVAILABLE) {
        return EngineError::FormatUnavailable(detail.unwrap_or_else(|| FORMAT_UNAVAILABLE.to_string()));
    }

    EngineError::Failed(detail.unwrap_or_else(|| format!("yt-dlp exited with status: {}", status)))
}
