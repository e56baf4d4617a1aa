use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

use crate::transcode::{MediaKind, TranscodeError};

/// Metric name prefix for all Voxa metrics
const PREFIX: &str = "voxa";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Transcoding Metrics
    pub static ref TRANSCODE_JOBS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_transcode_jobs_total"), "Transcoding pipeline runs by outcome"),
        &["pipeline", "status"]
    ).expect("Failed to create transcode_jobs_total metric");

    pub static ref TRANSCODE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_transcode_duration_seconds"),
            "Transcoding pipeline duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["pipeline"]
    ).expect("Failed to create transcode_duration_seconds metric");

    pub static ref TRANSCODE_JOBS_IN_FLIGHT: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_transcode_jobs_in_flight"), "Engine processes currently running"),
        &["pipeline"]
    ).expect("Failed to create transcode_jobs_in_flight metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(TRANSCODE_JOBS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TRANSCODE_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(TRANSCODE_JOBS_IN_FLIGHT.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a transcoding pipeline run
pub fn record_transcode<T>(
    kind: MediaKind,
    result: &Result<T, TranscodeError>,
    duration: Duration,
) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.label(),
    };
    TRANSCODE_JOBS_TOTAL
        .with_label_values(&[kind.as_str(), status])
        .inc();

    TRANSCODE_DURATION_SECONDS
        .with_label_values(&[kind.as_str()])
        .observe(duration.as_secs_f64());
}

/// Counts an engine process as running for as long as it is alive.
pub struct InFlightGuard {
    kind: MediaKind,
}

impl InFlightGuard {
    pub fn new(kind: MediaKind) -> Self {
        TRANSCODE_JOBS_IN_FLIGHT
            .with_label_values(&[kind.as_str()])
            .inc();
        Self { kind }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        TRANSCODE_JOBS_IN_FLIGHT
            .with_label_values(&[self.kind.as_str()])
            .dec();
    }
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // Parse the RSS (Resident Set Size) in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
