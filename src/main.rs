use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use voxa_media_server::server::{run_server, RequestsLoggingLevel};
use voxa_media_server::{config, metrics};
use voxa_media_server::transcode::{HttpAudioFetcher, Transcoder};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = config::DEFAULT_PORT)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory for intermediate media files. Defaults to the system temp dir.
    #[clap(long, value_parser = parse_path)]
    pub temp_dir: Option<PathBuf>,

    /// ffmpeg executable, looked up in PATH unless absolute.
    #[clap(long, default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable, looked up in PATH unless absolute.
    #[clap(long, default_value = "ffprobe")]
    pub ffprobe_path: PathBuf,

    /// Still image used as the video track for /convert.
    #[clap(long, value_parser = parse_path, default_value = config::DEFAULT_BACKGROUND_IMAGE)]
    pub background_image: PathBuf,

    /// Maximum number of ffmpeg processes running at once. Defaults to the CPU count.
    #[clap(long)]
    pub max_concurrent_jobs: Option<usize>,

    /// Seconds before a running ffmpeg/ffprobe process is killed.
    #[clap(long, default_value_t = config::DEFAULT_PROCESS_TIMEOUT_SEC)]
    pub process_timeout_sec: u64,

    /// Timeout in seconds for downloading remote audio.
    #[clap(long, default_value_t = config::DEFAULT_FETCH_TIMEOUT_SEC)]
    pub fetch_timeout_sec: u64,

    /// Largest remote audio file accepted, in bytes.
    #[clap(long, default_value_t = config::DEFAULT_MAX_FETCH_BYTES)]
    pub max_fetch_bytes: u64,

    /// Largest accepted upload body, in bytes.
    #[clap(long, default_value_t = config::DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            temp_dir: args.temp_dir.clone(),
            ffmpeg_path: args.ffmpeg_path.clone(),
            ffprobe_path: args.ffprobe_path.clone(),
            background_image: args.background_image.clone(),
            max_concurrent_jobs: args.max_concurrent_jobs,
            process_timeout_sec: args.process_timeout_sec,
            fetch_timeout_sec: args.fetch_timeout_sec,
            max_fetch_bytes: args.max_fetch_bytes,
            max_upload_bytes: args.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  port: {}", app_config.port);
    info!("  temp_dir: {:?}", app_config.temp_dir);
    info!("  ffmpeg: {:?}", app_config.ffmpeg_path);
    info!("  background_image: {:?}", app_config.background_image);
    info!("  max_concurrent_jobs: {}", app_config.max_concurrent_jobs);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let fetcher = HttpAudioFetcher::new(app_config.fetch_timeout(), app_config.fetch.max_bytes)?;
    let transcoder = Arc::new(Transcoder::new(
        app_config.transcoder_settings(),
        Arc::new(fetcher),
    ));
    transcoder
        .init()
        .await
        .with_context(|| format!("Failed to prepare temp dir {:?}", app_config.temp_dir))?;

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    tokio::select! {
        result = run_server(
            app_config.server_config(),
            transcoder,
            app_config.metrics_port,
        ) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
