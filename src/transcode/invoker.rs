//! Runs the external transcoding engine.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, error};

use super::error::{ProcessErrorKind, TranscodeError};
use super::job::TranscodeJob;

/// Spawns `program` with `args`, capturing stdout and stderr.
///
/// The child is killed if `timeout` elapses or if the returned future is
/// dropped before completion.
pub(super) async fn run_captured(
    program: &Path,
    args: &[OsString],
    timeout: Duration,
) -> Result<Output, TranscodeError> {
    let program_name = program.to_string_lossy().into_owned();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| TranscodeError::Process {
            program: program_name.clone(),
            kind: ProcessErrorKind::NotFound,
            diagnostic: e.to_string(),
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(TranscodeError::Io(e)),
        // The child future was dropped, kill_on_drop takes care of the process.
        Err(_) => Err(TranscodeError::Process {
            program: program_name,
            kind: ProcessErrorKind::TimedOut,
            diagnostic: format!("no exit after {}s", timeout.as_secs_f64()),
        }),
    }
}

/// Stdout and stderr merged into a single diagnostic string.
pub(super) fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !text.is_empty() && !stderr.is_empty() {
        text.push('\n');
    }
    text.push_str(&stderr);
    text
}

/// Invokes ffmpeg for a [`TranscodeJob`].
#[derive(Debug, Clone)]
pub struct TranscodeInvoker {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl TranscodeInvoker {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    /// Runs the job to completion. On success the output is expected at
    /// `job.output`, the caller verifies it by reading it back.
    pub async fn invoke(&self, job: &TranscodeJob<'_>) -> Result<(), TranscodeError> {
        let args = job.args();
        debug!(
            "Running {} job: {:?} {:?}",
            job.kind().as_str(),
            self.ffmpeg_path,
            args
        );

        let start = Instant::now();
        let output = run_captured(&self.ffmpeg_path, &args, self.timeout)
            .await
            .inspect_err(|e| {
                if let TranscodeError::Process { diagnostic, .. } = e {
                    error!("ffmpeg could not complete: {} ({})", e, diagnostic);
                }
            })?;

        if !output.status.success() {
            let diagnostic = combined_output(&output);
            error!(
                "ffmpeg exited with {} after {}ms: {}",
                output.status,
                start.elapsed().as_millis(),
                diagnostic
            );
            return Err(TranscodeError::Process {
                program: self.ffmpeg_path.to_string_lossy().into_owned(),
                kind: ProcessErrorKind::Failed,
                diagnostic,
            });
        }

        debug!(
            "ffmpeg {} job finished in {}ms",
            job.kind().as_str(),
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Checks that the ffmpeg binary can be executed.
    pub async fn check_available(&self) -> Result<(), TranscodeError> {
        let output = run_captured(
            &self.ffmpeg_path,
            &[OsString::from("-version")],
            self.timeout,
        )
        .await?;
        if !output.status.success() {
            return Err(TranscodeError::Process {
                program: self.ffmpeg_path.to_string_lossy().into_owned(),
                kind: ProcessErrorKind::Failed,
                diagnostic: combined_output(&output),
            });
        }
        Ok(())
    }
}
