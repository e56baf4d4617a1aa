use axum::extract::FromRef;

use crate::transcode::Transcoder;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedTranscoder = Arc<Transcoder>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub transcoder: GuardedTranscoder,
}

impl FromRef<ServerState> for GuardedTranscoder {
    fn from_ref(input: &ServerState) -> Self {
        input.transcoder.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
