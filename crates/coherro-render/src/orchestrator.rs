// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary-then-fallback rendering inside an ephemeral workspace.
//!
//! `Idle -> Primary -> {Succeeded | Fallback -> {Succeeded | Failed}}`.
//! Cancellation ends the request at any point without running the fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use coherro_config::CoherroConfig;
use coherro_core::CoherroError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::candidates::{CandidateContext, OutputCandidates, detect_scene_name};
use crate::diagnostic::{RenderDiagnostic, RenderFailure};
use crate::encoder::{FfmpegEncoder, MediaEncoder, PlaceholderSpec};
use crate::renderer::{SceneJob, SceneRenderer, SubprocessRenderer};
use crate::workspace::Workspace;

const WORKSPACE_PREFIX: &str = "motion-";
const TREE_LOG_DEPTH: usize = 3;

/// A rendered video and the workspace that holds it.
///
/// Dropping the artifact removes the workspace and the file with it.
#[derive(Debug)]
pub struct RenderArtifact {
    workspace: Workspace,
    local_path: PathBuf,
    pub used_fallback: bool,
    /// The primary renderer ran out of time before the fallback took over.
    pub duration_budget_exceeded: bool,
    pub diagnostic: Option<RenderDiagnostic>,
}

impl RenderArtifact {
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }
}

/// Filesystem layout of a render.
#[derive(Debug, Clone)]
pub struct RenderLayout {
    pub workspace_root: PathBuf,
    pub script_name: String,
    pub default_scene: String,
    pub output_name: String,
    pub candidates: OutputCandidates,
}

/// Produces a video for a piece of scene code, falling back to a placeholder.
pub struct RenderOrchestrator {
    layout: RenderLayout,
    renderer: Arc<dyn SceneRenderer>,
    encoder: Arc<dyn MediaEncoder>,
}

impl RenderOrchestrator {
    pub fn new(
        layout: RenderLayout,
        renderer: Arc<dyn SceneRenderer>,
        encoder: Arc<dyn MediaEncoder>,
    ) -> Self {
        Self {
            layout,
            renderer,
            encoder,
        }
    }

    /// Build the subprocess renderer and ffmpeg encoder described by the configuration.
    pub fn from_config(config: &CoherroConfig) -> Self {
        let render = &config.render;
        let fallback = &config.fallback;

        let renderer = SubprocessRenderer::new(
            render.program.clone(),
            render.args.clone(),
            Duration::from_secs(render.timeout_secs),
        );
        let encoder = FfmpegEncoder::new(
            fallback.ffmpeg_path.clone(),
            Duration::from_secs(fallback.timeout_secs),
            PlaceholderSpec {
                width: fallback.width,
                height: fallback.height,
                duration_secs: fallback.duration_secs,
                fps: fallback.fps,
                caption: fallback.caption.clone(),
                font_file: fallback.font_file.clone(),
            },
        );

        Self::new(
            RenderLayout {
                workspace_root: render.workspace_root.clone(),
                script_name: render.script_name.clone(),
                default_scene: render.default_scene.clone(),
                output_name: render.output_name.clone(),
                candidates: OutputCandidates::new(render.output_candidates.clone()),
            },
            Arc::new(renderer),
            Arc::new(encoder),
        )
    }

    /// Render `code` into a video.
    ///
    /// Fails only when the fallback also fails, or with
    /// [`CoherroError::Cancelled`] when `cancel` fires.
    pub async fn render(
        &self,
        code: &str,
        cancel: &CancellationToken,
    ) -> Result<RenderArtifact, CoherroError> {
        let workspace = Workspace::create(&self.layout.workspace_root, WORKSPACE_PREFIX)
            .map_err(|e| CoherroError::render("failed to create render workspace", e))?;
        let output = workspace.join(&self.layout.output_name);

        let started = Instant::now();
        let failure = match self.render_primary(&workspace, code, &output, cancel).await {
            Ok(()) => {
                return Ok(RenderArtifact {
                    workspace,
                    local_path: output,
                    used_fallback: false,
                    duration_budget_exceeded: false,
                    diagnostic: None,
                });
            }
            Err(RenderFailure::Cancelled) => return Err(CoherroError::Cancelled),
            Err(failure) => failure,
        };

        if cancel.is_cancelled() {
            return Err(CoherroError::Cancelled);
        }

        let diagnostic = RenderDiagnostic::from_failure(&failure, started.elapsed());
        warn!(
            target: "coherro_render::diagnostic",
            reason = %diagnostic.reason,
            exit_code = ?diagnostic.exit_code,
            elapsed_ms = diagnostic.elapsed.as_millis() as u64,
            searched = ?diagnostic.searched_paths,
            stderr_tail = %diagnostic.stderr_tail,
            "primary renderer failed, using placeholder"
        );

        match self.encoder.encode_placeholder(&output, cancel).await {
            Ok(()) => Ok(RenderArtifact {
                workspace,
                local_path: output,
                used_fallback: true,
                duration_budget_exceeded: matches!(failure, RenderFailure::TimedOut { .. }),
                diagnostic: Some(diagnostic),
            }),
            Err(RenderFailure::Cancelled) => Err(CoherroError::Cancelled),
            Err(e) => Err(CoherroError::render("fallback renderer failed", e)),
        }
    }

    async fn render_primary(
        &self,
        workspace: &Workspace,
        code: &str,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), RenderFailure> {
        let script = workspace.join(&self.layout.script_name);
        tokio::fs::write(&script, code).await?;

        let scene = detect_scene_name(code, &self.layout.default_scene);
        let job = SceneJob {
            workspace: workspace.path().to_path_buf(),
            script: script.clone(),
            scene: scene.clone(),
        };
        let run = self.renderer.render_scene(&job, cancel).await?;

        let cwd = std::env::current_dir()?;
        let script_stem = script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ctx = CandidateContext {
            workspace: workspace.path(),
            cwd: &cwd,
            script_stem: &script_stem,
            scene: &scene,
        };

        let (found, searched) = self.layout.candidates.find_first(&ctx).await;
        let Some(found) = found else {
            log_workspace_tree(workspace.path());
            return Err(RenderFailure::OutputMissing { searched });
        };

        let bytes = tokio::fs::copy(&found, output).await?;
        info!(
            scene = %scene,
            source = %found.display(),
            size_bytes = bytes,
            render_ms = run.elapsed.as_millis() as u64,
            renderer_output = %run.stdout_tail,
            "rendered video ready"
        );
        Ok(())
    }
}

fn log_workspace_tree(root: &Path) {
    let entries: Vec<String> = walkdir::WalkDir::new(root)
        .max_depth(TREE_LOG_DEPTH)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.display().to_string())
        })
        .filter(|p| !p.is_empty())
        .collect();
    debug!(workspace = %root.display(), ?entries, "renderer output not found");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Renderer that writes a file at a relative path, or fails.
    struct ScriptedRenderer {
        writes: Option<&'static str>,
        failure: Mutex<Option<RenderFailure>>,
    }

    #[async_trait]
    impl SceneRenderer for ScriptedRenderer {
        async fn render_scene(
            &self,
            job: &SceneJob,
            _cancel: &CancellationToken,
        ) -> Result<crate::renderer::RenderRun, RenderFailure> {
            if let Some(f) = self.failure.lock().unwrap().take() {
                return Err(f);
            }
            if let Some(rel) = self.writes {
                let path = job.workspace.join(rel.replace("{scene}", &job.scene));
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, b"primary").unwrap();
            }
            Ok(crate::renderer::RenderRun {
                elapsed: Duration::from_millis(1500),
                stdout_tail: "File ready at Circle.mp4".into(),
            })
        }
    }

    struct CountingEncoder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MediaEncoder for CountingEncoder {
        async fn encode_placeholder(
            &self,
            out_path: &Path,
            _cancel: &CancellationToken,
        ) -> Result<(), RenderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RenderFailure::NonZeroExit {
                    code: Some(1),
                    stderr_tail: "no encoder".into(),
                });
            }
            std::fs::write(out_path, b"placeholder").unwrap();
            Ok(())
        }
    }

    fn orchestrator(
        root: &Path,
        renderer: ScriptedRenderer,
        encoder: Arc<CountingEncoder>,
    ) -> RenderOrchestrator {
        RenderOrchestrator::new(
            RenderLayout {
                workspace_root: root.to_path_buf(),
                script_name: "scene.py".into(),
                default_scene: "Scene".into(),
                output_name: "output.mp4".into(),
                candidates: OutputCandidates::new(vec![
                    "{workspace}/media/videos/{script_stem}/480p15/{scene}.mp4".into(),
                ]),
            },
            Arc::new(renderer),
            encoder,
        )
    }

    fn encoder(fail: bool) -> Arc<CountingEncoder> {
        Arc::new(CountingEncoder {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    const CODE: &str = "class Circle(Scene):\n    pass\n";

    #[tokio::test]
    async fn primary_output_is_copied_to_canonical_path() {
        let root = tempfile::tempdir().unwrap();
        let enc = encoder(false);
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: Some("media/videos/scene/480p15/{scene}.mp4"),
                failure: Mutex::new(None),
            },
            enc.clone(),
        );

        let artifact = orch.render(CODE, &CancellationToken::new()).await.unwrap();
        assert!(!artifact.used_fallback);
        assert!(artifact.diagnostic.is_none());
        assert!(artifact.local_path().ends_with("output.mp4"));
        assert_eq!(std::fs::read(artifact.local_path()).unwrap(), b"primary");
        assert_eq!(
            std::fs::read_to_string(artifact.workspace_path().join("scene.py")).unwrap(),
            CODE
        );
        assert_eq!(enc.calls.load(Ordering::SeqCst), 0);

        let ws = artifact.workspace_path().to_path_buf();
        drop(artifact);
        assert!(!ws.exists());
    }

    #[tokio::test]
    async fn missing_output_falls_back() {
        let root = tempfile::tempdir().unwrap();
        let enc = encoder(false);
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: None,
                failure: Mutex::new(None),
            },
            enc.clone(),
        );

        let artifact = orch.render(CODE, &CancellationToken::new()).await.unwrap();
        assert!(artifact.used_fallback);
        assert!(!artifact.duration_budget_exceeded);
        let diag = artifact.diagnostic.as_ref().unwrap();
        assert_eq!(diag.reason, crate::diagnostic::FailureKind::OutputMissing);
        assert_eq!(diag.searched_paths.len(), 1);
        assert!(diag.searched_paths[0].ends_with("media/videos/scene/480p15/Circle.mp4"));
        assert_eq!(std::fs::read(artifact.local_path()).unwrap(), b"placeholder");
        assert_eq!(enc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_marks_budget_exceeded() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: None,
                failure: Mutex::new(Some(RenderFailure::TimedOut {
                    after: Duration::from_secs(60),
                })),
            },
            encoder(false),
        );

        let artifact = orch.render(CODE, &CancellationToken::new()).await.unwrap();
        assert!(artifact.used_fallback);
        assert!(artifact.duration_budget_exceeded);
    }

    #[tokio::test]
    async fn cancellation_skips_fallback_and_removes_workspace() {
        let root = tempfile::tempdir().unwrap();
        let enc = encoder(false);
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: None,
                failure: Mutex::new(Some(RenderFailure::Cancelled)),
            },
            enc.clone(),
        );

        let err = orch.render(CODE, &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(enc.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn fallback_failure_is_fatal_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: None,
                failure: Mutex::new(Some(RenderFailure::NonZeroExit {
                    code: Some(1),
                    stderr_tail: "Traceback".into(),
                })),
            },
            encoder(true),
        );

        let err = orch.render(CODE, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoherroError::Render { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn fallback_logs_structured_diagnostic() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: None,
                failure: Mutex::new(Some(RenderFailure::NonZeroExit {
                    code: Some(1),
                    stderr_tail: "NameError: Circl".into(),
                })),
            },
            encoder(false),
        );

        orch.render(CODE, &CancellationToken::new()).await.unwrap();
        assert!(logs_contain("primary renderer failed"));
        assert!(logs_contain("non_zero_exit"));
        assert!(logs_contain("NameError: Circl"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn primary_success_logs_renderer_run() {
        let root = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            root.path(),
            ScriptedRenderer {
                writes: Some("media/videos/scene/480p15/{scene}.mp4"),
                failure: Mutex::new(None),
            },
            encoder(false),
        );

        orch.render(CODE, &CancellationToken::new()).await.unwrap();
        assert!(logs_contain("rendered video ready"));
        assert!(logs_contain("render_ms=1500"));
        assert!(logs_contain("File ready at Circle.mp4"));
    }
}
