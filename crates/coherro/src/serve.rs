// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `coherro serve` implementation.
//!
//! Wires storage, the Gemini provider, the render orchestrator and the
//! publisher into a generation pipeline and serves it over the gateway
//! until a shutdown signal arrives.

use std::sync::Arc;

use coherro_agent::{GenerationPipeline, PipelineSettings, install_signal_handler};
use coherro_config::CoherroConfig;
use coherro_core::{CoherroError, PluginAdapter, StorageAdapter};
use coherro_gateway::{GatewayState, ServerConfig, start_server};
use coherro_gemini::GeminiProvider;
use coherro_publish::ArtifactPublisher;
use coherro_render::RenderOrchestrator;
use coherro_storage::SqliteStorage;
use tracing::{error, info};

/// Runs the server until SIGINT/SIGTERM, then shuts down cleanly.
pub async fn run_serve(config: CoherroConfig) -> Result<(), CoherroError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting coherro serve");

    // Initialize storage.
    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    // Initialize Gemini provider.
    let provider = {
        let p = GeminiProvider::new(&config).await.map_err(|e| {
            error!(error = %e, "failed to initialize Gemini provider");
            eprintln!(
                "error: Gemini API key required. Set via: config (model.api_key), COHERRO_MODEL_API_KEY or GEMINI_API_KEY"
            );
            e
        })?;
        Arc::new(p)
    };
    info!(provider = provider.name(), "model provider ready");

    let renderer = Arc::new(RenderOrchestrator::from_config(&config));
    let publisher = Arc::new(ArtifactPublisher::from_config(&config)?);

    let pipeline = Arc::new(GenerationPipeline::new(
        storage,
        provider,
        renderer,
        publisher,
        PipelineSettings::from_config(&config),
    ));

    let cancel = install_signal_handler();
    let state = GatewayState::new(pipeline.clone(), cancel, config.gateway.event_buffer);
    let server_config = ServerConfig::from(&config.gateway);

    let served = start_server(&server_config, state).await;
    pipeline.shutdown().await;

    served?;
    info!("coherro serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coherro={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
