//! Test fixtures: fake media engine binaries and a remote audio host
//!
//! The engine stand-ins are `/bin/sh` scripts, so these tests only run on unix.

use super::constants::*;
use anyhow::Result;
use axum::{http::header, routing::get, Router};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

/// How the fake ffmpeg behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeEngine {
    /// Writes its own argument list to the output path and exits 0
    Echo,
    /// Prints a diagnostic to stderr and exits 1 without writing output
    Failing,
}

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(
        &path,
        format!("#!/bin/sh\n[ \"$1\" = \"-version\" ] && exit 0\n{}\n", body),
    )?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Creates fake ffmpeg and ffprobe executables in `dir`
/// Returns (ffmpeg_path, ffprobe_path)
pub fn create_fake_engine(dir: &Path, engine: FakeEngine) -> Result<(PathBuf, PathBuf)> {
    let ffmpeg_body = match engine {
        FakeEngine::Echo => "for last in \"$@\"; do :; done\nprintf '%s ' \"$@\" > \"$last\"",
        FakeEngine::Failing => {
            "echo 'Error while decoding stream #0:0: Invalid data found' >&2\nexit 1"
        }
    };
    let ffmpeg = write_script(dir, "ffmpeg", ffmpeg_body)?;
    let ffprobe = write_script(
        dir,
        "ffprobe",
        &format!(
            "printf '{{\"format\":{{\"filename\":\"x\",\"duration\":\"{}\"}}}}'",
            REPORTED_DURATION
        ),
    )?;
    Ok((ffmpeg, ffprobe))
}

/// Writes the background image into `dir` and returns its path
pub fn create_background_image(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("bg.jpg");
    fs::write(&path, TEST_IMAGE_BYTES)?;
    Ok(path)
}

/// A local HTTP host serving recordings for `/convert`
///
/// Serves `TEST_AUDIO_BYTES` at `REMOTE_AUDIO_PATH`, an oversized body at
/// `/recordings/huge.mp3` and 404 for everything else.
pub struct AudioHost {
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl AudioHost {
    pub async fn spawn() -> Self {
        let app = Router::new()
            .route(
                REMOTE_AUDIO_PATH,
                get(|| async { ([(header::CONTENT_TYPE, "audio/mpeg")], TEST_AUDIO_BYTES) }),
            )
            .route(
                "/recordings/huge.mp3",
                get(|| async { vec![0u8; TEST_MAX_FETCH_BYTES as usize + 1] }),
            );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind audio host");
        let port = listener.local_addr().expect("No local address").port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Audio host failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for AudioHost {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
