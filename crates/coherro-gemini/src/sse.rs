// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for `streamGenerateContent?alt=sse` responses.
//!
//! Every event carries a full `GenerateContentResponse` JSON document; the
//! text of its first candidate is the next delta. Chunks without text
//! (usage-only trailers, empty parts) are skipped.

use coherro_core::{CoherroError, DeltaStream};
use eventsource_stream::Eventsource;
use futures::stream::StreamExt;

use crate::types::{ApiErrorResponse, GenerateContentResponse};

/// Parses a streaming response into a stream of text deltas.
pub fn parse_sse_stream(response: reqwest::Response) -> DeltaStream {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => parse_event_data(&event.data).transpose(),
            Err(e) => Some(Err(CoherroError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

/// Maps one SSE `data` payload to an optional delta.
pub(crate) fn parse_event_data(data: &str) -> Result<Option<String>, CoherroError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }

    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
        return Err(CoherroError::Provider {
            message: format!(
                "Gemini stream error ({} {}): {}",
                api_err.error.code, api_err.error.status, api_err.error.message
            ),
            source: None,
        });
    }

    let chunk: GenerateContentResponse =
        serde_json::from_str(data).map_err(|e| CoherroError::Provider {
            message: format!("failed to parse stream chunk: {e}"),
            source: Some(Box::new(e)),
        })?;

    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(CoherroError::Provider {
            message: format!("prompt blocked by model: {reason}"),
            source: None,
        });
    }

    let text = chunk.text();
    Ok((!text.is_empty()).then_some(text))
}
