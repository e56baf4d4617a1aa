//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own fake engine and temp dir.

use super::constants::*;
use super::fixtures::{create_background_image, create_fake_engine, FakeEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use voxa_media_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use voxa_media_server::transcode::{HttpAudioFetcher, Transcoder, TranscoderSettings};

/// Test server instance with an isolated working directory
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Directory the transcoder allocates intermediate files in
    pub temp_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _work_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server whose ffmpeg echoes its arguments
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeEngine::Echo).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates fake ffmpeg/ffprobe scripts and a background image
    /// 2. Builds a transcoder rooted in a fresh temp dir
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    pub async fn spawn_with(engine: FakeEngine) -> Self {
        let work_dir = TempDir::new().expect("Failed to create work dir");
        let (ffmpeg_path, ffprobe_path) =
            create_fake_engine(work_dir.path(), engine).expect("Failed to create fake engine");
        let background_image =
            create_background_image(work_dir.path()).expect("Failed to create background image");
        let temp_dir = work_dir.path().join("tmp");

        let settings = TranscoderSettings {
            ffmpeg_path,
            ffprobe_path,
            temp_dir: temp_dir.clone(),
            background_image,
            max_concurrent_jobs: 2,
            process_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        };
        let fetcher = HttpAudioFetcher::new(
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            TEST_MAX_FETCH_BYTES,
        )
        .expect("Failed to build fetcher");
        let transcoder = Arc::new(Transcoder::new(settings, Arc::new(fetcher)));
        transcoder.init().await.expect("Failed to init transcoder");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        };
        let app = make_app(config, transcoder);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            temp_dir,
            _work_dir: work_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Number of files currently in the transcoder's temp dir
    pub fn leftover_temp_files(&self) -> usize {
        std::fs::read_dir(&self.temp_dir)
            .expect("Temp dir missing")
            .count()
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
