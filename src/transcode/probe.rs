//! Duration probing with ffprobe.

use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

use super::error::{ProcessErrorKind, TranscodeError};
use super::invoker::{combined_output, run_captured};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration of a media file as reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Raw `format.duration` string, e.g. `"12.500000"`.
    pub duration: String,
    pub duration_secs: f64,
}

impl ProbeResult {
    /// Parses ffprobe's `-print_format json -show_format` document.
    pub fn from_json(json: &str) -> Result<Self, TranscodeError> {
        let probe: FfprobeOutput = serde_json::from_str(json)
            .map_err(|e| TranscodeError::Parse(format!("JSON parse error: {}", e)))?;

        let duration = probe
            .format
            .duration
            .ok_or_else(|| TranscodeError::Parse("No duration in probe output".to_string()))?;

        let duration_secs: f64 = duration
            .trim()
            .parse()
            .map_err(|_| TranscodeError::Parse(format!("Invalid duration: {:?}", duration)))?;

        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(TranscodeError::Parse(format!(
                "Invalid duration: {:?}",
                duration
            )));
        }

        Ok(Self {
            duration: duration.trim().to_string(),
            duration_secs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaProbe {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl MediaProbe {
    pub fn new(ffprobe_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    pub async fn probe(&self, path: &Path) -> Result<ProbeResult, TranscodeError> {
        let mut args: Vec<OsString> = ["-v", "quiet", "-print_format", "json", "-show_format"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_owned());

        let output = run_captured(&self.ffprobe_path, &args, self.timeout).await?;

        if !output.status.success() {
            let diagnostic = combined_output(&output);
            error!("ffprobe failed on {:?}: {}", path, diagnostic);
            return Err(TranscodeError::Process {
                program: self.ffprobe_path.to_string_lossy().into_owned(),
                kind: ProcessErrorKind::Failed,
                diagnostic,
            });
        }

        let result = ProbeResult::from_json(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {:?}: {}s", path, result.duration);
        Ok(result)
    }
}
