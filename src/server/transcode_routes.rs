//! Transcoding HTTP routes.
//!
//! Provides endpoints for:
//! - Listing the available voice profiles
//! - Applying a voice profile to an uploaded recording
//! - Rendering a remote recording as a still-image video

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::server::state::{GuardedTranscoder, ServerState};
use crate::transcode::{MediaKind, ProcessErrorKind, ProfileSummary, TranscodeError};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error body of `/convert`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body of `/process`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    #[serde(rename = "audioUrl", default)]
    pub audio_url: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<ProfileSummary>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Maps a pipeline failure to a response. Diagnostics stay in the logs.
///
/// Audio jobs answer with a `message` body, video jobs with an `error` body.
struct ApiError {
    kind: MediaKind,
    err: TranscodeError,
}

impl ApiError {
    fn audio(err: TranscodeError) -> Self {
        Self {
            kind: MediaKind::Audio,
            err,
        }
    }

    fn video(err: TranscodeError) -> Self {
        Self {
            kind: MediaKind::Video,
            err,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.err;
        let status = match &err {
            TranscodeError::Validation(_) => StatusCode::BAD_REQUEST,
            TranscodeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            TranscodeError::Process {
                kind: ProcessErrorKind::TimedOut,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            TranscodeError::Process { .. }
            | TranscodeError::Parse(_)
            | TranscodeError::Storage { .. }
            | TranscodeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if err.is_client_error() {
            debug!("Rejected transcoding request: {}", err);
        } else {
            error!("Transcoding failed: {}", err);
        }

        let message = err.public_message(self.kind);
        match self.kind {
            MediaKind::Audio => message_response(status, message),
            MediaKind::Video => error_response(status, message),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /voices - List voice profiles
async fn list_voices(State(transcoder): State<GuardedTranscoder>) -> impl IntoResponse {
    Json(VoicesResponse {
        voices: transcoder.catalog().summaries(),
    })
}

/// POST /process - Apply a voice profile (multipart/form-data: `file`, `voice`)
async fn process_audio(
    State(transcoder): State<GuardedTranscoder>,
    mut multipart: Multipart,
) -> Response {
    let mut data: Option<Vec<u8>> = None;
    let mut voice = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart request: {}", e);
                return message_response(e.status(), "Malformed multipart request");
            }
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => match field.bytes().await {
                Ok(bytes) => data = Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read file data: {}", e);
                    return message_response(e.status(), "Failed to read file");
                }
            },
            "voice" => match field.text().await {
                Ok(value) => voice = value.trim().to_string(),
                Err(e) => return message_response(e.status(), "Failed to read voice"),
            },
            _ => {}
        }
    }

    let data = match data {
        Some(d) if !d.is_empty() => d,
        _ => return message_response(StatusCode::BAD_REQUEST, "No file uploaded"),
    };

    debug!("Processing {} bytes with voice {:?}", data.len(), voice);

    match transcoder.transform_audio(&voice, &data).await {
        Ok(audio) => (
            [
                (header::CONTENT_TYPE, "audio/mpeg"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"processed.mp3\"",
                ),
            ],
            audio,
        )
            .into_response(),
        Err(e) => ApiError::audio(e).into_response(),
    }
}

/// GET /convert?audioUrl=... - Render remote audio over the background image
async fn convert_to_video(
    State(transcoder): State<GuardedTranscoder>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    match transcoder.compose_video(&query.audio_url).await {
        Ok(video) => ([(header::CONTENT_TYPE, "video/mp4")], video).into_response(),
        Err(e) => ApiError::video(e).into_response(),
    }
}

pub fn make_transcode_routes(max_upload_bytes: usize) -> Router<ServerState> {
    Router::new()
        .route("/voices", get(list_voices))
        .route(
            "/process",
            post(process_audio).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/convert", get(convert_to_video))
}
