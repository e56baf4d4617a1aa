mod file_config;

pub use file_config::{FetchConfig, FileConfig};

use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::transcode::TranscoderSettings;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_BACKGROUND_IMAGE: &str = "./bg.jpg";
pub const DEFAULT_PROCESS_TIMEOUT_SEC: u64 = 300;
pub const DEFAULT_FETCH_TIMEOUT_SEC: u64 = 60;
pub const DEFAULT_MAX_FETCH_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub temp_dir: Option<PathBuf>,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub background_image: PathBuf,
    pub max_concurrent_jobs: Option<usize>,
    pub process_timeout_sec: u64,
    pub fetch_timeout_sec: u64,
    pub max_fetch_bytes: u64,
    pub max_upload_bytes: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            logging_level: RequestsLoggingLevel::default(),
            temp_dir: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            background_image: PathBuf::from(DEFAULT_BACKGROUND_IMAGE),
            max_concurrent_jobs: None,
            process_timeout_sec: DEFAULT_PROCESS_TIMEOUT_SEC,
            fetch_timeout_sec: DEFAULT_FETCH_TIMEOUT_SEC,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_bytes: usize,

    // Media engine
    pub temp_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub background_image: PathBuf,
    pub max_concurrent_jobs: usize,
    pub process_timeout_sec: u64,

    // Remote audio
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub timeout_sec: u64,
    pub max_bytes: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_upload_bytes = file.max_upload_bytes.unwrap_or(cli.max_upload_bytes);
        if max_upload_bytes == 0 {
            bail!("max_upload_bytes must be positive");
        }

        let temp_dir = file
            .temp_dir
            .map(PathBuf::from)
            .or_else(|| cli.temp_dir.clone())
            .unwrap_or_else(std::env::temp_dir);
        if temp_dir.exists() {
            if !temp_dir.is_dir() {
                bail!("temp_dir is not a directory: {:?}", temp_dir);
            }
        } else if let Some(parent) = temp_dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Parent of temp_dir does not exist: {:?}", parent);
            }
        }

        let ffmpeg_path = file
            .ffmpeg_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.ffmpeg_path.clone());
        let ffprobe_path = file
            .ffprobe_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.ffprobe_path.clone());
        let background_image = file
            .background_image
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.background_image.clone());

        let max_concurrent_jobs = file
            .max_concurrent_jobs
            .or(cli.max_concurrent_jobs)
            .unwrap_or_else(default_concurrent_jobs);
        if max_concurrent_jobs == 0 {
            bail!("max_concurrent_jobs must be at least 1");
        }

        let process_timeout_sec = file
            .process_timeout_sec
            .unwrap_or(cli.process_timeout_sec);
        if process_timeout_sec == 0 {
            bail!("process_timeout_sec must be positive");
        }

        // Fetch settings - TOML [fetch] section merged over CLI values
        let fetch_file = file.fetch.unwrap_or_default();
        let fetch = FetchSettings {
            timeout_sec: fetch_file.timeout_sec.unwrap_or(cli.fetch_timeout_sec),
            max_bytes: fetch_file.max_bytes.unwrap_or(cli.max_fetch_bytes),
        };
        if fetch.timeout_sec == 0 {
            bail!("fetch timeout_sec must be positive");
        }
        if fetch.max_bytes == 0 {
            bail!("fetch max_bytes must be positive");
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            max_upload_bytes,
            temp_dir,
            ffmpeg_path,
            ffprobe_path,
            background_image,
            max_concurrent_jobs,
            process_timeout_sec,
            fetch,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn transcoder_settings(&self) -> TranscoderSettings {
        TranscoderSettings {
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
            temp_dir: self.temp_dir.clone(),
            background_image: self.background_image.clone(),
            max_concurrent_jobs: self.max_concurrent_jobs,
            process_timeout: Duration::from_secs(self.process_timeout_sec),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_sec)
    }
}

fn default_concurrent_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
