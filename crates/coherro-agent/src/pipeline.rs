// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generation pipeline: prompt in, published video out.
//!
//! Steps run strictly in order and every suspension point (model stream,
//! renderer, upload) races the request's cancellation token. Terminal events
//! (`complete`, `error`) are left to the caller so that it can update its
//! own state first.

use std::sync::Arc;
use std::time::Duration;

use coherro_config::CoherroConfig;
use coherro_core::types::{
    AdapterType, ArtifactKey, CompletionRequest, GenerationOutcome, HealthStatus, TurnRole,
};
use coherro_core::{CoherroError, DeltaStream, PluginAdapter, ProviderAdapter, StorageAdapter};
use coherro_publish::ArtifactPublisher;
use coherro_render::RenderOrchestrator;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{
    EventSink, GENERATING_RESPONSE_MESSAGE, GENERATING_VIDEO_MESSAGE, PROCESSING_MESSAGE,
    ServerEvent,
};
use crate::request::GenerationRequest;

/// Tunables for the model call.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_output_tokens: u32,
    /// Longest wait for the next delta before the request fails.
    pub stream_idle_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &CoherroConfig) -> Self {
        Self {
            max_output_tokens: config.model.max_output_tokens,
            stream_idle_timeout: Duration::from_secs(config.model.stream_idle_timeout_secs),
        }
    }
}

/// Health of one collaborator adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterHealth {
    pub name: String,
    pub adapter_type: AdapterType,
    pub version: semver::Version,
    pub status: HealthStatus,
}

impl AdapterHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Run one adapter's health check. A failed check counts as unhealthy.
async fn check_adapter<A: PluginAdapter + ?Sized>(adapter: &A) -> AdapterHealth {
    let status = match adapter.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    if status != HealthStatus::Healthy {
        warn!(adapter = adapter.name(), ?status, "adapter not healthy");
    }
    AdapterHealth {
        name: adapter.name().to_string(),
        adapter_type: adapter.adapter_type(),
        version: adapter.version(),
        status,
    }
}

/// Sequences storage, model, parser, renderer and publisher for one prompt.
pub struct GenerationPipeline {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    renderer: Arc<RenderOrchestrator>,
    publisher: Arc<ArtifactPublisher>,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        renderer: Arc<RenderOrchestrator>,
        publisher: Arc<ArtifactPublisher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            storage,
            provider,
            renderer,
            publisher,
            settings,
        }
    }

    /// Health of storage, the model provider and the object store (if any).
    pub async fn adapter_health(&self) -> Vec<AdapterHealth> {
        let mut report = vec![
            check_adapter(self.storage.as_ref()).await,
            check_adapter(self.provider.as_ref()).await,
        ];
        if let Some(store) = self.publisher.object_store() {
            report.push(check_adapter(store.as_ref()).await);
        }
        report
    }

    /// Shut down every adapter, closing storage last. Failures are logged.
    pub async fn shutdown(&self) {
        if let Err(e) = self.provider.shutdown().await {
            warn!(adapter = self.provider.name(), error = %e, "adapter shutdown error");
        }
        if let Some(store) = self.publisher.object_store()
            && let Err(e) = store.shutdown().await
        {
            warn!(adapter = store.name(), error = %e, "adapter shutdown error");
        }
        if let Err(e) = self.storage.close().await {
            warn!(adapter = self.storage.name(), error = %e, "failed to close storage cleanly");
        }
    }

    /// Run one prompt to completion, emitting progress on `events`.
    ///
    /// Input errors are reported before anything is persisted.
    pub async fn run(
        &self,
        prompt: &str,
        project_id: &str,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, CoherroError> {
        let request = GenerationRequest::new(prompt, project_id)?;
        self.run_request(request, events, cancel).await
    }

    /// Like [`run`](Self::run) for an already validated request.
    pub async fn run_request(
        &self,
        mut request: GenerationRequest,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, CoherroError> {
        let project_id = request.project_id.clone();
        info!(project_id = %project_id, "prompt received");

        let user_turn = self
            .storage
            .append_turn(&project_id, TurnRole::User, &request.prompt_text)
            .await?;
        events.emit(ServerEvent::status(PROCESSING_MESSAGE)).await;

        let turns = self.storage.list_turns(&project_id).await?;
        debug!(project_id = %project_id, turns = turns.len(), "conversation loaded");
        let completion = CompletionRequest {
            system_instruction: None,
            turns,
            max_output_tokens: self.settings.max_output_tokens,
        };
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoherroError::Cancelled),
            stream = self.provider.stream_completion(completion) => stream?,
        };
        events.emit(ServerEvent::status(GENERATING_RESPONSE_MESSAGE)).await;

        self.consume_stream(stream, &mut request, events, cancel)
            .await?;

        let finished = request.finish();
        let record_id = self
            .storage
            .create_generation_record(&user_turn, &finished.code, &finished.explanation)
            .await?;
        if !request.accumulated_text.trim().is_empty() {
            self.storage
                .append_turn(&project_id, TurnRole::Model, &request.accumulated_text)
                .await?;
        }
        if finished.code.is_empty() {
            warn!(project_id = %project_id, "model response contained no code");
        }
        events
            .emit(ServerEvent::ExplanationFinal {
                content: finished.explanation.clone(),
            })
            .await;

        events.emit(ServerEvent::status(GENERATING_VIDEO_MESSAGE)).await;
        let artifact = self.renderer.render(&finished.code, cancel).await?;
        let used_fallback = artifact.used_fallback;
        let key = ArtifactKey::new(project_id.clone(), user_turn.0.clone());
        let published = self.publisher.publish(artifact, &key, cancel).await?;
        self.storage
            .update_generation_record(&record_id, &published.url)
            .await?;
        info!(
            project_id = %project_id,
            record_id = %record_id,
            storage_kind = %published.storage_kind,
            used_fallback,
            "video published"
        );

        events
            .emit(ServerEvent::VideoReady {
                video_url: published.url.clone(),
                code: Some(finished.code.clone()),
                explanation: Some(finished.explanation.clone()),
            })
            .await;

        Ok(GenerationOutcome {
            full_response: request.accumulated_text,
            code: finished.code,
            explanation: finished.explanation,
            full_text: finished.full_text,
            video_url: published.url,
            used_fallback,
        })
    }

    /// Feed every delta to the parser, emitting each new explanation.
    async fn consume_stream(
        &self,
        mut stream: DeltaStream,
        request: &mut GenerationRequest,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CoherroError> {
        let idle = self.settings.stream_idle_timeout;
        let mut deltas = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CoherroError::Cancelled),
                next = tokio::time::timeout(idle, stream.next()) => next,
            };
            match next {
                Ok(Some(Ok(delta))) => {
                    deltas += 1;
                    if let Some(explanation) = request.push_delta(&delta) {
                        events
                            .emit(ServerEvent::ExplanationChunk {
                                content: explanation,
                            })
                            .await;
                    }
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => break,
                Err(_) => return Err(CoherroError::Timeout { duration: idle }),
            }
        }
        debug!(
            deltas,
            response_len = request.accumulated_text.len(),
            "model stream finished"
        );
        Ok(())
    }
}
