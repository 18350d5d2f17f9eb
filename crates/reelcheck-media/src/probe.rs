//! FFprobe duration probing.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use mockall::automock;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Arguments asking ffprobe for the bare container duration.
const DURATION_ARGS: [&str; 6] = [
    "-v",
    "error",
    "-show_entries",
    "format=duration",
    "-of",
    "default=noprint_wrappers=1:nokey=1",
];

/// Measures the duration of a stored media file.
#[automock]
#[async_trait]
pub trait DurationProber: Send + Sync {
    /// Duration in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;
}

/// [`DurationProber`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProber {
    program: OsString,
}

impl Default for FfprobeDurationProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeDurationProber {
    /// Use `program` as the ffprobe executable (a bare name is looked up on PATH).
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured executable can be resolved.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

#[async_trait]
impl DurationProber for FfprobeDurationProber {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        let output = Command::new(&self.program)
            .args(DURATION_ARGS)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    MediaError::FfprobeNotFound(self.program.to_string_lossy().into_owned())
                }
                _ => MediaError::Io(e),
            })?;

        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                "FFprobe exited with failure",
                Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
                output.status.code(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = parse_duration(&stdout)?;
        debug!(path = %path.display(), duration, "Probed duration");
        Ok(duration)
    }
}

/// Parse ffprobe's plain `format=duration` output.
///
/// Only finite, non-negative numbers are accepted; ffprobe prints `N/A` for
/// containers without a duration.
pub fn parse_duration(output: &str) -> MediaResult<f64> {
    let trimmed = output.trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(MediaError::InvalidDuration(trimmed.to_string())),
    }
}
