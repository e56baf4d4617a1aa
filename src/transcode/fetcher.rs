//! Fetching remote audio over HTTP.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::TranscodeError;

/// Source of remote audio bytes.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TranscodeError>;
}

/// Fetches audio with a shared `reqwest` client, capping the body size.
pub struct HttpAudioFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpAudioFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_bytes })
    }

    fn too_large(&self) -> TranscodeError {
        TranscodeError::Upstream(format!(
            "Remote audio exceeds {:#}",
            byte_unit::Byte::from(self.max_bytes)
        ))
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TranscodeError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TranscodeError::Validation("audioUrl is required".to_string()));
        }
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| TranscodeError::Validation(format!("Invalid audioUrl: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TranscodeError::Validation(format!(
                "Unsupported audioUrl scheme: {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| TranscodeError::Upstream(format!("Failed to download audio: {}", e)))?;

        if !response.status().is_success() {
            warn!("Remote audio {} answered {}", url, response.status());
            return Err(TranscodeError::Upstream(format!(
                "Remote audio answered with status {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large());
            }
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| TranscodeError::Upstream(format!("Failed to read audio data: {}", e)))?;
            if (data.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large());
            }
            data.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} bytes from {}", data.len(), url);
        Ok(data)
    }
}
