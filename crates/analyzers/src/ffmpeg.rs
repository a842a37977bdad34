//! Frame extraction backed by the ffmpeg command line tools
//!
//! Duration probing goes through ffprobe and single-frame extraction
//! through ffmpeg, both as child processes. Seeking before the input keeps
//! extraction fast regardless of clip length.

use crate::{AnalyzerError, FrameExtractor, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// ffmpeg/ffprobe CLI frame extractor
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    /// ffmpeg executable name or path
    pub ffmpeg_bin: String,

    /// ffprobe executable name or path
    pub ffprobe_bin: String,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        if !media.exists() {
            return Err(AnalyzerError::MediaNotFound(media.to_path_buf()));
        }

        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(media)
            .output()
            .await?;

        if !output.status.success() {
            return Err(AnalyzerError::Decode(format!(
                "ffprobe failed for {}: {}",
                media.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = stdout.trim().parse::<f64>().map_err(|_| {
            AnalyzerError::Decode(format!(
                "ffprobe returned no duration for {}",
                media.display()
            ))
        })?;

        debug!(media = %media.display(), duration, "probed media duration");
        Ok(duration)
    }

    async fn extract_frame(&self, media: &Path, at_secs: f64, dest: &Path) -> Result<()> {
        if !media.exists() {
            return Err(AnalyzerError::MediaNotFound(media.to_path_buf()));
        }

        let output = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-ss", &format!("{at_secs}")])
            .arg("-i")
            .arg(media)
            .args(["-frames:v", "1", "-q:v", "2", "-y"])
            .arg(dest)
            .output()
            .await?;

        if !output.status.success() || !dest.exists() {
            return Err(AnalyzerError::Decode(format!(
                "ffmpeg failed to extract frame at {at_secs}s from {}: {}",
                media.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(media = %media.display(), at_secs, dest = %dest.display(), "extracted frame");
        Ok(())
    }
}
