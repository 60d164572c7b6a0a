// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete generation pipeline with a mock
//! provider, stub renderer and encoder, temp SQLite database and temp
//! render/publish directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use coherro_agent::{
    EventSink, GenerationPipeline, PipelineSettings, ServerEvent, SessionController,
};
use coherro_config::model::StorageConfig;
use coherro_core::types::GenerationOutcome;
use coherro_core::{CoherroError, ObjectStore, StorageAdapter};
use coherro_publish::ArtifactPublisher;
use coherro_render::{OutputCandidates, RenderLayout, RenderOrchestrator};
use coherro_storage::SqliteStorage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::mock_provider::{MockProvider, MockReply};
use crate::mock_render::{RenderBehavior, STUB_OUTPUT_TEMPLATE, StubEncoder, StubRenderer};
use crate::mock_storage::MemoryStorage;
use crate::mock_store::RecordingObjectStore;

/// Events buffered for [`TestHarness::run`].
const RUN_EVENT_BUFFER: usize = 256;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    delta_delay: Option<Duration>,
    render: RenderBehavior,
    failing_encoder: bool,
    object_store: Option<RecordingObjectStore>,
    stream_idle_timeout: Duration,
    memory_storage: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            delta_delay: None,
            render: RenderBehavior::Succeed,
            failing_encoder: false,
            object_store: None,
            stream_idle_timeout: Duration::from_secs(5),
            memory_storage: false,
        }
    }

    /// Set scripted provider replies.
    pub fn with_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Sleep before every streamed delta.
    pub fn with_delta_delay(mut self, delay: Duration) -> Self {
        self.delta_delay = Some(delay);
        self
    }

    pub fn with_render(mut self, behavior: RenderBehavior) -> Self {
        self.render = behavior;
        self
    }

    pub fn with_failing_encoder(mut self) -> Self {
        self.failing_encoder = true;
        self
    }

    /// Publish through this store instead of keeping videos locally.
    pub fn with_object_store(mut self, store: RecordingObjectStore) -> Self {
        self.object_store = Some(store);
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    /// Keep turns and records in [`MemoryStorage`] instead of a temporary SQLite file.
    pub fn with_memory_storage(mut self) -> Self {
        self.memory_storage = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CoherroError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| CoherroError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let workspace_root = temp_dir.path().join("workspaces");
        let local_dir = temp_dir.path().join("videos");

        let storage: Arc<dyn StorageAdapter> = if self.memory_storage {
            Arc::new(MemoryStorage::new())
        } else {
            Arc::new(SqliteStorage::new(StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            }))
        };
        storage.initialize().await?;

        let mut provider = MockProvider::with_replies(self.replies);
        if let Some(delay) = self.delta_delay {
            provider = provider.with_delta_delay(delay);
        }
        let provider = Arc::new(provider);

        let renderer = Arc::new(StubRenderer::new(self.render));
        let encoder = Arc::new(if self.failing_encoder {
            StubEncoder::failing()
        } else {
            StubEncoder::new()
        });
        let orchestrator = Arc::new(RenderOrchestrator::new(
            RenderLayout {
                workspace_root: workspace_root.clone(),
                script_name: "scene.py".into(),
                default_scene: "CircleAnimation".into(),
                output_name: "output.mp4".into(),
                candidates: OutputCandidates::new(vec![STUB_OUTPUT_TEMPLATE.into()]),
            },
            renderer.clone(),
            encoder.clone(),
        ));

        let object_store = self.object_store.map(Arc::new);
        let publisher = Arc::new(ArtifactPublisher::new(
            object_store
                .clone()
                .map(|store| store as Arc<dyn ObjectStore>),
            local_dir.clone(),
            "videos",
            Duration::from_secs(5),
        ));

        let pipeline = Arc::new(GenerationPipeline::new(
            storage.clone(),
            provider.clone(),
            orchestrator.clone(),
            publisher.clone(),
            PipelineSettings {
                max_output_tokens: 1024,
                stream_idle_timeout: self.stream_idle_timeout,
            },
        ));

        Ok(TestHarness {
            storage,
            provider,
            renderer,
            encoder,
            object_store,
            orchestrator,
            publisher,
            pipeline,
            workspace_root,
            local_dir,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired pipeline over mock adapters.
pub struct TestHarness {
    pub storage: Arc<dyn StorageAdapter>,
    pub provider: Arc<MockProvider>,
    pub renderer: Arc<StubRenderer>,
    pub encoder: Arc<StubEncoder>,
    pub object_store: Option<Arc<RecordingObjectStore>>,
    pub orchestrator: Arc<RenderOrchestrator>,
    pub publisher: Arc<ArtifactPublisher>,
    pub pipeline: Arc<GenerationPipeline>,
    workspace_root: PathBuf,
    local_dir: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one prompt through the pipeline and collect every event it emitted.
    pub async fn run(
        &self,
        prompt: &str,
        project_id: &str,
    ) -> (Result<GenerationOutcome, CoherroError>, Vec<ServerEvent>) {
        let (events, mut rx) = EventSink::channel(RUN_EVENT_BUFFER);
        let result = self
            .pipeline
            .run(prompt, project_id, &events, &CancellationToken::new())
            .await;
        drop(events);

        let mut emitted = Vec::new();
        while let Some(event) = rx.recv().await {
            emitted.push(event);
        }
        (result, emitted)
    }

    /// A session controller over this pipeline and the receiving end of its events.
    pub fn session(
        &self,
        parent: &CancellationToken,
    ) -> (SessionController, mpsc::Receiver<ServerEvent>) {
        let (events, rx) = EventSink::channel(RUN_EVENT_BUFFER);
        let controller = SessionController::new(
            "test-session",
            Arc::clone(&self.pipeline),
            events,
            parent,
        );
        (controller, rx)
    }

    /// Parent directory of every render workspace.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Directory videos are moved to when no object store takes them.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Render workspaces currently on disk.
    pub fn live_workspaces(&self) -> usize {
        std::fs::read_dir(&self.workspace_root)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}

/// Receive events until a terminal one (`complete` or `error`) arrives.
///
/// Returns everything received, terminal event last. Fails if `limit` passes
/// first or the channel closes.
pub async fn collect_until_terminal(
    rx: &mut mpsc::Receiver<ServerEvent>,
    limit: Duration,
) -> Result<Vec<ServerEvent>, CoherroError> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    return Ok(events);
                }
            }
            Ok(None) => {
                return Err(CoherroError::Internal(
                    "event channel closed before a terminal event".into(),
                ));
            }
            Err(_) => return Err(CoherroError::Timeout { duration: limit }),
        }
    }
}
