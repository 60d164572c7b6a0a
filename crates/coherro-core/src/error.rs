// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Coherro generation pipeline.

use thiserror::Error;

/// The primary error type used across all Coherro adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum CoherroError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Client connection errors (bind failure, socket closed).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Model provider errors (transport failure, API error, malformed stream).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rendering failed, including the fallback renderer.
    #[error("render error: {message}")]
    Render {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Publishing the rendered artifact failed.
    #[error("publish error: {message}")]
    Publish {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A client message was malformed or missing required fields.
    #[error("invalid request: {0}")]
    Protocol(String),

    /// A generation request is already in flight on this session.
    #[error("a generation is already in progress for this session")]
    SessionBusy,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The request was cancelled because its client went away.
    #[error("request cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoherroError {
    /// Returns true if this error is the result of cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoherroError::Cancelled)
    }

    /// Shorthand for a render error with an underlying cause.
    pub fn render(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CoherroError::Render {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Shorthand for a publish error with an underlying cause.
    pub fn publish(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CoherroError::Publish {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
