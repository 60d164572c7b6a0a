// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary scene renderer capability and its subprocess implementation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::diagnostic::{RenderFailure, STDERR_TAIL_BYTES, tail_lossy};

/// One scene to render.
#[derive(Debug, Clone)]
pub struct SceneJob {
    /// Working directory for the renderer.
    pub workspace: PathBuf,
    /// Script file inside the workspace.
    pub script: PathBuf,
    pub scene: String,
}

/// What a successful renderer run reported.
#[derive(Debug, Clone)]
pub struct RenderRun {
    pub elapsed: Duration,
    pub stdout_tail: String,
}

/// Turns a scene script into a video file somewhere the candidates can find it.
///
/// Implementations must stop promptly when `cancel` fires and return
/// [`RenderFailure::Cancelled`].
#[async_trait]
pub trait SceneRenderer: Send + Sync {
    async fn render_scene(
        &self,
        job: &SceneJob,
        cancel: &CancellationToken,
    ) -> Result<RenderRun, RenderFailure>;
}

/// Runs an external program with `{script}` and `{scene}` substituted into its arguments.
#[derive(Debug, Clone)]
pub struct SubprocessRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn expand_args(&self, job: &SceneJob) -> Vec<String> {
        let script = job.script.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{script}", &script).replace("{scene}", &job.scene))
            .collect()
    }
}

#[async_trait]
impl SceneRenderer for SubprocessRenderer {
    async fn render_scene(
        &self,
        job: &SceneJob,
        cancel: &CancellationToken,
    ) -> Result<RenderRun, RenderFailure> {
        let args = self.expand_args(job);
        debug!(program = %self.program, ?args, "starting renderer");

        let started = Instant::now();
        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .current_dir(&job.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderFailure::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = tokio::time::sleep(self.timeout) => {
                return Err(RenderFailure::TimedOut { after: self.timeout });
            }
            _ = cancel.cancelled() => return Err(RenderFailure::Cancelled),
        };

        let elapsed = started.elapsed();
        if !output.status.success() {
            return Err(RenderFailure::NonZeroExit {
                code: output.status.code(),
                stderr_tail: tail_lossy(&output.stderr, STDERR_TAIL_BYTES),
            });
        }

        info!(
            scene = %job.scene,
            elapsed_ms = elapsed.as_millis() as u64,
            "renderer finished"
        );
        Ok(RenderRun {
            elapsed,
            stdout_tail: tail_lossy(&output.stdout, STDERR_TAIL_BYTES),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(dir: &std::path::Path) -> SceneJob {
        SceneJob {
            workspace: dir.to_path_buf(),
            script: dir.join("scene.py"),
            scene: "Circle".into(),
        }
    }

    fn sh(script: &str, timeout: Duration) -> SubprocessRenderer {
        SubprocessRenderer::new("sh", vec!["-c".into(), script.into()], timeout)
    }

    #[test]
    fn arguments_are_templated() {
        let renderer = SubprocessRenderer::new(
            "python",
            ["-m", "manim", "-ql", "{script}", "{scene}"]
                .into_iter()
                .map(String::from)
                .collect(),
            Duration::from_secs(60),
        );
        let args = renderer.expand_args(&job(std::path::Path::new("/ws")));
        assert_eq!(args, vec!["-m", "manim", "-ql", "/ws/scene.py", "Circle"]);
    }

    #[tokio::test]
    async fn runs_in_workspace_directory() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = sh("touch ran-here", Duration::from_secs(10));
        renderer
            .render_scene(&job(dir.path()), &CancellationToken::new())
            .await
            .unwrap();
        assert!(dir.path().join("ran-here").exists());
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = sh("echo boom >&2; exit 3", Duration::from_secs(10));
        let err = renderer
            .render_scene(&job(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            RenderFailure::NonZeroExit { code, stderr_tail } => {
                assert_eq!(code, Some(3));
                assert!(stderr_tail.contains("boom"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = sh("sleep 30", Duration::from_millis(200));
        let started = Instant::now();
        let err = renderer
            .render_scene(&job(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancellation_stops_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = sh("sleep 30", Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let started = Instant::now();
        let err = renderer
            .render_scene(&job(dir.path()), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SubprocessRenderer::new(
            "coherro-definitely-not-installed",
            vec![],
            Duration::from_secs(1),
        );
        let err = renderer
            .render_scene(&job(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderFailure::Spawn { .. }));
    }
}
