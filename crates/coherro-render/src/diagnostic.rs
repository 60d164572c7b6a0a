// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of renderer failures and the record kept when the fallback runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Bytes of stderr kept for diagnostics.
pub const STDERR_TAIL_BYTES: usize = 2048;

/// Why a renderer or encoder invocation did not produce a video.
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("renderer exited with status {code:?}")]
    NonZeroExit {
        code: Option<i32>,
        stderr_tail: String,
    },

    #[error("renderer exceeded its {after:?} budget")]
    TimedOut { after: Duration },

    #[error("renderer finished but no output was found")]
    OutputMissing { searched: Vec<PathBuf> },

    #[error("workspace I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

impl RenderFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            RenderFailure::Spawn { .. } => FailureKind::SpawnFailed,
            RenderFailure::NonZeroExit { .. } => FailureKind::NonZeroExit,
            RenderFailure::TimedOut { .. } => FailureKind::TimedOut,
            RenderFailure::OutputMissing { .. } => FailureKind::OutputMissing,
            RenderFailure::Io(_) => FailureKind::Io,
            RenderFailure::Cancelled => FailureKind::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SpawnFailed,
    NonZeroExit,
    TimedOut,
    OutputMissing,
    Io,
    Cancelled,
}

/// Internal record of why the primary renderer was abandoned. Never sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RenderDiagnostic {
    pub reason: FailureKind,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
    pub elapsed: Duration,
    pub searched_paths: Vec<PathBuf>,
}

impl RenderDiagnostic {
    pub fn from_failure(failure: &RenderFailure, elapsed: Duration) -> Self {
        let (exit_code, stderr_tail, searched_paths) = match failure {
            RenderFailure::NonZeroExit { code, stderr_tail } => {
                (*code, stderr_tail.clone(), Vec::new())
            }
            RenderFailure::OutputMissing { searched } => (Some(0), String::new(), searched.clone()),
            other => (None, other.to_string(), Vec::new()),
        };
        Self {
            reason: failure.kind(),
            exit_code,
            stderr_tail,
            elapsed,
            searched_paths,
        }
    }
}

/// Last `max` bytes of `bytes` as lossy UTF-8.
pub fn tail_lossy(bytes: &[u8], max: usize) -> String {
    let start = bytes.len().saturating_sub(max);
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}
