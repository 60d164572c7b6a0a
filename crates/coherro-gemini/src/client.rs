// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `streamGenerateContent` endpoint.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication, and a single retry on transient errors.

use std::time::Duration;

use coherro_core::{CoherroError, DeltaStream};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, GenerateContentRequest};

/// Default base URL for the Generative Language API.
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for Gemini API communication.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client that authenticates with `api_key` and targets `model`.
    ///
    /// `base_url` defaults to [`API_BASE_URL`] when `None`.
    pub fn new(
        api_key: SecretString,
        model: String,
        base_url: Option<String>,
    ) -> Result<Self, CoherroError> {
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| CoherroError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        // No overall timeout; the pipeline bounds the gap between deltas.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoherroError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            max_retries: 1,
            base_url: base_url
                .unwrap_or_else(|| API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    /// Sends a streaming request and returns a stream of text deltas.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn stream_generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<DeltaStream, CoherroError> {
        let url = self.stream_url();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| CoherroError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %self.model, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_sse_stream(response));
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(CoherroError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(CoherroError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| CoherroError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
