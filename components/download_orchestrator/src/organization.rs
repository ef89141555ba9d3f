// components/download_orchestrator/src/organization.rs
use std::path::{Path, PathBuf};

use crate::metadata::MediaInfo;

/// Engine output template placing files as `<dir>/<title>.<ext>`
pub fn output_template(dir: &Path) -> String {
    dir.join("%(title)s.%(ext)s").to_string_lossy().into_owned()
}

/// Where a finished download ended up.
///
/// Prefers the path the engine reported; otherwise rebuilds it from the
/// title and extension the same way the output template does.
pub fn resolve_output_path(dir: &Path, info: &MediaInfo, audio_codec: Option<&str>) -> PathBuf {
    if let Some(path) = info.filepath.as_deref().filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        return if path.is_absolute() { path } else { dir.join(path) };
    }

    let title = info.title.as_deref().unwrap_or("video");
    let ext = match audio_codec {
        Some(codec) => codec,
        None => info.ext.as_deref().unwrap_or("mp4"),
    };
    dir.join(format!("{}.{}", sanitize_filename::sanitize(title), ext))
}
