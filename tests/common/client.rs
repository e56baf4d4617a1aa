//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all media server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /voices
    pub async fn voices(&self) -> Response {
        self.client
            .get(format!("{}/voices", self.base_url))
            .send()
            .await
            .expect("Voices request failed")
    }

    /// POST /process with both `file` and `voice` fields
    pub async fn process_audio(&self, data: &[u8], voice: &str) -> Response {
        let form = Form::new()
            .part(
                "file",
                Part::bytes(data.to_vec())
                    .file_name("recording.mp3")
                    .mime_str("audio/mpeg")
                    .expect("Invalid mime type"),
            )
            .text("voice", voice.to_string());
        self.send_process_form(form).await
    }

    /// POST /process with only the `voice` field
    pub async fn process_without_file(&self, voice: &str) -> Response {
        let form = Form::new().text("voice", voice.to_string());
        self.send_process_form(form).await
    }

    async fn send_process_form(&self, form: Form) -> Response {
        self.client
            .post(format!("{}/process", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Process request failed")
    }

    /// GET /convert?audioUrl=...
    pub async fn convert(&self, audio_url: &str) -> Response {
        self.client
            .get(format!("{}/convert", self.base_url))
            .query(&[("audioUrl", audio_url)])
            .send()
            .await
            .expect("Convert request failed")
    }

    /// GET /convert without any query string
    pub async fn convert_without_url(&self) -> Response {
        self.client
            .get(format!("{}/convert", self.base_url))
            .send()
            .await
            .expect("Convert request failed")
    }
}
