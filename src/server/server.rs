use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::transcode_routes::make_transcode_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::metrics;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn make_app(config: ServerConfig, transcoder: GuardedTranscoder) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        transcoder,
    };

    Router::new()
        .route("/", get(home))
        .merge(make_transcode_routes(config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    transcoder: GuardedTranscoder,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, transcoder);

    let metrics_listener = TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", e);
        }
    });

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
