//! The audio-transform and video-compose pipelines.
//!
//! Every pipeline follows the same shape: validate, allocate temp resources,
//! run the engine, read the output back into memory. Temp resources are owned
//! by the pipeline scope, so they are released on every exit path including a
//! dropped future.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::error::{FileStage, TranscodeError};
use super::fetcher::AudioFetcher;
use super::filters::FilterCatalog;
use super::invoker::TranscodeInvoker;
use super::job::{CompositionSpec, MediaKind, TranscodeJob};
use super::probe::MediaProbe;
use super::temp_files::TempFiles;
use crate::metrics;

#[derive(Debug, Clone)]
pub struct TranscoderSettings {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub temp_dir: PathBuf,
    pub background_image: PathBuf,
    pub max_concurrent_jobs: usize,
    pub process_timeout: Duration,
}

/// Runs the transcoding pipelines, bounding how many engine processes may
/// run at once.
pub struct Transcoder {
    catalog: &'static FilterCatalog,
    temp_files: TempFiles,
    invoker: TranscodeInvoker,
    probe: MediaProbe,
    fetcher: Arc<dyn AudioFetcher>,
    background_image: PathBuf,
    permits: Semaphore,
}

impl Transcoder {
    pub fn new(settings: TranscoderSettings, fetcher: Arc<dyn AudioFetcher>) -> Self {
        Self {
            catalog: FilterCatalog::global(),
            temp_files: TempFiles::new(settings.temp_dir),
            invoker: TranscodeInvoker::new(settings.ffmpeg_path, settings.process_timeout),
            probe: MediaProbe::new(settings.ffprobe_path, settings.process_timeout),
            fetcher,
            background_image: settings.background_image,
            permits: Semaphore::new(settings.max_concurrent_jobs.max(1)),
        }
    }

    pub fn catalog(&self) -> &'static FilterCatalog {
        self.catalog
    }

    /// Creates the temp directory and reports whether the engine binaries run.
    pub async fn init(&self) -> std::io::Result<()> {
        self.temp_files.init().await?;

        if let Err(e) = self.invoker.check_available().await {
            warn!("ffmpeg is not usable, transcoding requests will fail: {}", e);
        }
        if !self.background_image.exists() {
            warn!(
                "Background image {:?} not found, video composition will fail",
                self.background_image
            );
        }
        Ok(())
    }

    /// Applies the voice profile `selector` to `audio`, returning mp3 bytes.
    pub async fn transform_audio(
        &self,
        selector: &str,
        audio: &[u8],
    ) -> Result<Vec<u8>, TranscodeError> {
        let start = Instant::now();
        let result = self.run_transform_audio(selector, audio).await;
        metrics::record_transcode(MediaKind::Audio, &result, start.elapsed());
        result
    }

    async fn run_transform_audio(
        &self,
        selector: &str,
        audio: &[u8],
    ) -> Result<Vec<u8>, TranscodeError> {
        let chain = self
            .catalog
            .resolve(selector)
            .ok_or_else(|| TranscodeError::Validation("Invalid voice option".to_string()))?;
        if audio.is_empty() {
            return Err(TranscodeError::Validation("No file uploaded".to_string()));
        }

        let input = self.temp_files.acquire("input", "mp3")?;
        let output = self.temp_files.acquire("output", "mp3")?;

        tokio::fs::write(input.path(), audio)
            .await
            .map_err(|e| TranscodeError::storage(FileStage::SaveInput, e))?;
        debug!("Persisted {} bytes to {:?}", audio.len(), input.path());

        let job = TranscodeJob::filter_audio(input.path(), output.path(), chain);
        self.run_job(&job).await?;

        let data = tokio::fs::read(output.path())
            .await
            .map_err(|e| TranscodeError::storage(FileStage::ReadOutput, e))?;
        info!(
            "Applied voice {} to {} bytes of audio ({} bytes out)",
            selector,
            audio.len(),
            data.len()
        );
        Ok(data)
    }

    /// Downloads `audio_url` and renders it over the background image as mp4.
    pub async fn compose_video(&self, audio_url: &str) -> Result<Vec<u8>, TranscodeError> {
        let start = Instant::now();
        let result = self.run_compose_video(audio_url).await;
        metrics::record_transcode(MediaKind::Video, &result, start.elapsed());
        result
    }

    async fn run_compose_video(&self, audio_url: &str) -> Result<Vec<u8>, TranscodeError> {
        if !tokio::fs::try_exists(&self.background_image)
            .await
            .unwrap_or(false)
        {
            return Err(TranscodeError::Validation(format!(
                "Image file not found: {}",
                self.background_image.display()
            )));
        }

        let download_start = Instant::now();
        let audio_data = self.fetcher.fetch(audio_url).await?;
        if audio_data.is_empty() {
            return Err(TranscodeError::Upstream("Remote audio is empty".to_string()));
        }

        let audio = self.temp_files.acquire("audio", "mp3")?;
        tokio::fs::write(audio.path(), &audio_data)
            .await
            .map_err(|e| TranscodeError::storage(FileStage::SaveInput, e))?;
        debug!(
            "Downloaded {} bytes of audio in {}ms",
            audio_data.len(),
            download_start.elapsed().as_millis()
        );

        let probe = self.probe.probe(audio.path()).await?;
        debug!("Audio duration: {} seconds", probe.duration);

        let output = self.temp_files.acquire("video", "mp4")?;
        let job = TranscodeJob::compose_video(
            CompositionSpec {
                image: self.background_image.clone(),
                audio: audio.path().to_path_buf(),
                duration: probe.duration,
            },
            output.path(),
        );
        self.run_job(&job).await?;

        let data = tokio::fs::read(output.path())
            .await
            .map_err(|e| TranscodeError::storage(FileStage::ReadOutput, e))?;
        info!(
            "Composed {}s video ({} bytes) from {}",
            probe.duration_secs,
            data.len(),
            audio_url
        );
        Ok(data)
    }

    async fn run_job(&self, job: &TranscodeJob<'_>) -> Result<(), TranscodeError> {
        let wait_start = Instant::now();
        // The semaphore is never closed.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TranscodeError::Io(std::io::Error::other(e)))?;
        let waited = wait_start.elapsed();
        if waited > Duration::from_secs(1) {
            debug!("Waited {}ms for a transcode slot", waited.as_millis());
        }

        let _in_flight = metrics::InFlightGuard::new(job.kind());
        self.invoker.invoke(job).await
    }
}
