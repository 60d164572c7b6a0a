// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles GET /health and POST /v1/prompt.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use coherro_agent::{AdapterHealth, EventSink, GenerationRequest, client_message};
use coherro_core::CoherroError;
use coherro_core::types::{AdapterType, HealthStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::server::GatewayState;

/// Request body for POST /v1/prompt.
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, rename = "projectId")]
    pub project_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub websocket: String,
    pub active_sessions: usize,
    pub adapters: Vec<AdapterReport>,
}

/// One adapter's entry in [`HealthResponse`].
#[derive(Debug, Serialize)]
pub struct AdapterReport {
    pub name: String,
    #[serde(rename = "type")]
    pub adapter_type: AdapterType,
    pub version: String,
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<AdapterHealth> for AdapterReport {
    fn from(health: AdapterHealth) -> Self {
        let (status, detail) = match health.status {
            HealthStatus::Healthy => ("healthy", None),
            HealthStatus::Degraded(reason) => ("degraded", Some(reason)),
            HealthStatus::Unhealthy(reason) => ("unhealthy", Some(reason)),
        };
        Self {
            name: health.name,
            adapter_type: health.adapter_type,
            version: health.version.to_string(),
            status,
            detail,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn with_status(status: StatusCode, error: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                error: error.into(),
            }),
        )
            .into_response()
    }
}

/// GET /health
///
/// Reports `OK` when every adapter is healthy and `DEGRADED` otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let adapters = state.pipeline.adapter_health().await;
    let status = if adapters.iter().all(AdapterHealth::is_healthy) {
        "OK"
    } else {
        "DEGRADED"
    };
    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        websocket: "enabled".to_string(),
        active_sessions: state.active_sessions(),
        adapters: adapters.into_iter().map(AdapterReport::from).collect(),
    })
}

/// POST /v1/prompt
///
/// Runs the generation pipeline without streaming and returns the final
/// outcome. Progress events are discarded.
pub async fn post_prompt(
    State(state): State<GatewayState>,
    Json(body): Json<PromptRequest>,
) -> Response {
    let request = match GenerationRequest::new(&body.prompt, &body.project_id) {
        Ok(request) => request,
        Err(e) => return ErrorResponse::with_status(StatusCode::BAD_REQUEST, client_message(&e)),
    };

    let project_id = request.project_id.clone();
    let cancel = state.shutdown.child_token();
    match state
        .pipeline
        .run_request(request, &EventSink::discard(), &cancel)
        .await
    {
        Ok(outcome) => {
            info!(project_id = %project_id, video_url = %outcome.video_url, "HTTP prompt complete");
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            warn!(project_id = %project_id, error = %e, "HTTP prompt failed");
            let status = match e {
                CoherroError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            ErrorResponse::with_status(status, client_message(&e))
        }
    }
}
