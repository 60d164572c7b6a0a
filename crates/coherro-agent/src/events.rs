// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session event protocol.
//!
//! Every message on the session channel is one JSON object tagged by `type`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Status sent when a client connects.
pub const CONNECTED_MESSAGE: &str = "Connected to worker server";
pub const PROCESSING_MESSAGE: &str = "Processing prompt...";
pub const GENERATING_RESPONSE_MESSAGE: &str = "Generating response...";
pub const GENERATING_VIDEO_MESSAGE: &str = "Generating video...";
pub const COMPLETE_MESSAGE: &str = "Animation generation complete!";
/// Client-facing text for any pipeline failure; details stay in the logs.
pub const FAILURE_MESSAGE: &str = "Failed to process prompt";

/// Server-to-client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Status {
        message: String,
    },
    ExplanationChunk {
        content: String,
    },
    ExplanationFinal {
        content: String,
    },
    VideoReady {
        #[serde(rename = "videoUrl")]
        video_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    Complete {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this event ends a request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain string-keyed enum cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Client-to-server messages. Unknown `type` values deserialize to [`ClientMessage::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Prompt {
        #[serde(default)]
        prompt: String,
        #[serde(default, rename = "projectId")]
        project_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Ordered outbound event channel for one session.
///
/// Emitting never fails: once the receiving side is gone, events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<ServerEvent>,
}

impl EventSink {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// A sink whose events go nowhere, for callers that only want the outcome.
    pub fn discard() -> Self {
        let (sink, _rx) = Self::channel(1);
        sink
    }

    pub async fn emit(&self, event: ServerEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("event receiver closed, dropping event");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
