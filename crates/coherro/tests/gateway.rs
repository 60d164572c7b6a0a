// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP routes driven in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use coherro_core::StorageAdapter;
use coherro_core::types::TurnRole;
use coherro_gateway::{GatewayState, ServerConfig, router};
use coherro_test_utils::{MockReply, RecordingObjectStore, TestHarness};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn app(harness: &TestHarness) -> axum::Router {
    let state = GatewayState::new(harness.pipeline.clone(), CancellationToken::new(), 16);
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        http_concurrency: 2,
    };
    router(&config, state)
}

fn post_prompt(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/prompt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = app(&harness)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["websocket"], "enabled");
    assert_eq!(body["active_sessions"], 0);
    assert!(body["timestamp"].as_str().is_some());

    let adapters = body["adapters"].as_array().unwrap();
    let types: Vec<&str> = adapters.iter().map(|a| a["type"].as_str().unwrap()).collect();
    assert_eq!(types, ["storage", "provider"]);
    assert!(adapters.iter().all(|a| a["status"] == "healthy"));
}

#[tokio::test]
async fn unhealthy_object_store_degrades_health() {
    let harness = TestHarness::builder()
        .with_object_store(RecordingObjectStore::failing())
        .build()
        .await
        .unwrap();
    let response = app(&harness)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "DEGRADED");
    let store = &body["adapters"][2];
    assert_eq!(store["name"], "recording-object-store");
    assert_eq!(store["type"], "object_store");
    assert_eq!(store["status"], "unhealthy");
    assert_eq!(store["detail"], "uploads rejected");
}

#[tokio::test]
async fn prompt_returns_outcome() {
    let harness = TestHarness::builder()
        .with_replies(vec![MockReply::deltas([
            "<code>from manim import *\nclass Dot1(Scene): pass</code>\n",
            "<explanation>Shows a dot.</explanation>",
        ])])
        .with_memory_storage()
        .build()
        .await
        .unwrap();

    let response = app(&harness)
        .oneshot(post_prompt(r#"{"prompt":"draw a dot","projectId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["code"], "from manim import *\nclass Dot1(Scene): pass");
    assert_eq!(body["explanation"], "Shows a dot.");
    assert!(body["fullResponse"].as_str().unwrap().contains("<code>"));
    assert!(body["fullText"].as_str().unwrap().contains("Shows a dot."));
    assert!(body["videoUrl"].as_str().unwrap().starts_with("file://"));

    let turns = harness.storage.list_turns("p1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "draw a dot");
    assert_eq!(turns[1].role, TurnRole::Model);
}

#[tokio::test]
async fn prompt_without_project_is_bad_request() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = app(&harness)
        .oneshot(post_prompt(r#"{"prompt":"draw a dot"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("projectId"));
    assert!(harness.provider.requests().await.is_empty());
}

#[tokio::test]
async fn pipeline_failure_is_internal_error() {
    let harness = TestHarness::builder()
        .with_replies(vec![MockReply::Fail("upstream down".into())])
        .build()
        .await
        .unwrap();

    let response = app(&harness)
        .oneshot(post_prompt(r#"{"prompt":"draw a dot","projectId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to process prompt");
}
