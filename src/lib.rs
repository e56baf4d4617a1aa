//! Voxa Media Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod metrics;
pub mod server;
pub mod transcode;

// Re-export commonly used types for convenience
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use transcode::{
    AudioFetcher, FilterCatalog, HttpAudioFetcher, TranscodeError, Transcoder, TranscoderSettings,
};
