// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use coherro_agent::{GenerationPipeline, SessionController};
use coherro_config::model::GatewayConfig;
use coherro_core::CoherroError;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<GenerationPipeline>,
    /// Live WebSocket sessions by connection id.
    pub sessions: Arc<DashMap<String, Arc<SessionController>>>,
    /// Root token; every session and HTTP generation runs under a child of it.
    pub shutdown: CancellationToken,
    /// Capacity of each session's outbound event queue.
    pub event_buffer: usize,
}

impl GatewayState {
    pub fn new(
        pipeline: Arc<GenerationPipeline>,
        shutdown: CancellationToken,
        event_buffer: usize,
    ) -> Self {
        Self {
            pipeline,
            sessions: Arc::new(DashMap::new()),
            shutdown,
            event_buffer,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

/// Gateway server configuration (mirrors GatewayConfig from coherro-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Concurrent `POST /v1/prompt` generations.
    pub http_concurrency: usize,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            http_concurrency: config.http_concurrency,
        }
    }
}

/// Build the application router.
///
/// - GET /health
/// - POST /v1/prompt
/// - GET /ws
pub fn router(config: &ServerConfig, state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/v1/prompt",
            post(handlers::post_prompt)
                .layer(ConcurrencyLimitLayer::new(config.http_concurrency.max(1))),
        )
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server.
///
/// Runs until the state's shutdown token is cancelled, then stops accepting
/// connections and waits for open ones to finish.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), CoherroError> {
    let shutdown = state.shutdown.clone();
    let app = router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CoherroError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(%addr, "gateway server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| CoherroError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server stopped");
    Ok(())
}
