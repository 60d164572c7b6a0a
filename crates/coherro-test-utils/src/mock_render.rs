// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scene renderer and placeholder encoder stand-ins.
//!
//! Neither touches an external program; both write small files so the
//! orchestrator's output discovery and cleanup run for real.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use coherro_render::{MediaEncoder, RenderFailure, RenderRun, SceneJob, SceneRenderer};

/// Output template matching where [`StubRenderer`] writes.
pub const STUB_OUTPUT_TEMPLATE: &str = "{workspace}/out/{scene}.mp4";

/// Bytes written by the stub renderer.
pub const RENDERED_BYTES: &[u8] = b"rendered video";

/// Bytes written by the stub encoder.
pub const PLACEHOLDER_BYTES: &[u8] = b"placeholder video";

/// How [`StubRenderer`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBehavior {
    /// Write a video where [`STUB_OUTPUT_TEMPLATE`] points.
    Succeed,
    /// Exit with status 1.
    Fail,
    /// Exit cleanly without writing anything.
    NoOutput,
    /// Block until cancelled.
    Hang,
}

/// A scene renderer with scripted behavior that records what happened.
pub struct StubRenderer {
    behavior: RenderBehavior,
    runs: AtomicUsize,
    cancelled: AtomicBool,
    last_workspace: Mutex<Option<PathBuf>>,
    started: Notify,
}

impl StubRenderer {
    pub fn new(behavior: RenderBehavior) -> Self {
        Self {
            behavior,
            runs: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            last_workspace: Mutex::new(None),
            started: Notify::new(),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// True once a render has been stopped by its cancellation token.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Workspace of the most recent render.
    pub fn last_workspace(&self) -> Option<PathBuf> {
        self.last_workspace.lock().ok().and_then(|w| w.clone())
    }

    /// Resolves once a render has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl SceneRenderer for StubRenderer {
    async fn render_scene(
        &self,
        job: &SceneJob,
        cancel: &CancellationToken,
    ) -> Result<RenderRun, RenderFailure> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_workspace.lock() {
            *slot = Some(job.workspace.clone());
        }
        self.started.notify_one();

        match self.behavior {
            RenderBehavior::Succeed => {
                let path = job.workspace.join("out").join(format!("{}.mp4", job.scene));
                write_file(&path, RENDERED_BYTES).await?;
            }
            RenderBehavior::Fail => {
                return Err(RenderFailure::NonZeroExit {
                    code: Some(1),
                    stderr_tail: "stub renderer failed".into(),
                });
            }
            RenderBehavior::NoOutput => {}
            RenderBehavior::Hang => {
                cancel.cancelled().await;
                self.cancelled.store(true, Ordering::SeqCst);
                return Err(RenderFailure::Cancelled);
            }
        }

        Ok(RenderRun {
            elapsed: Duration::from_millis(1),
            stdout_tail: String::new(),
        })
    }
}

/// A placeholder encoder that writes [`PLACEHOLDER_BYTES`], or fails.
pub struct StubEncoder {
    fail: bool,
    calls: AtomicUsize,
}

impl StubEncoder {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaEncoder for StubEncoder {
    async fn encode_placeholder(
        &self,
        out_path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), RenderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderFailure::NonZeroExit {
                code: Some(1),
                stderr_tail: "stub encoder failed".into(),
            });
        }
        write_file(out_path, PLACEHOLDER_BYTES).await?;
        Ok(())
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
