// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler speaking the session event protocol.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "prompt", "prompt": "draw a circle", "projectId": "p1"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "status", "message": "Processing prompt..."}
//! {"type": "explanation_chunk", "content": "partial..."}
//! {"type": "explanation_final", "content": "..."}
//! {"type": "video_ready", "videoUrl": "...", "code": "...", "explanation": "..."}
//! {"type": "complete", "message": "Animation generation complete!"}
//! {"type": "error", "message": "..."}
//! ```

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use coherro_agent::events::CONNECTED_MESSAGE;
use coherro_agent::{EventSink, ServerEvent, SessionController};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::server::GatewayState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
///
/// A sender task forwards session events to the client while this task reads
/// client frames. When the client goes away the session is closed, which
/// cancels and awaits any in-flight generation.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let ws_id = uuid::Uuid::new_v4().to_string();

    let (events, mut rx) = EventSink::channel(state.event_buffer);
    let controller = Arc::new(SessionController::new(
        ws_id.clone(),
        Arc::clone(&state.pipeline),
        events.clone(),
        &state.shutdown,
    ));
    state.sessions.insert(ws_id.clone(), Arc::clone(&controller));
    info!(ws_id = %ws_id, active = state.sessions.len(), "WebSocket connection established");

    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if ws_sender
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    events.emit(ServerEvent::status(CONNECTED_MESSAGE)).await;

    loop {
        let msg = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            msg = ws_receiver.next() => msg,
        };
        match msg {
            Some(Ok(Message::Text(text))) => {
                let text_str: &str = &text;
                controller.handle_message(text_str).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {} // Binary and ping frames carry no protocol messages.
            Some(Err(e)) => {
                warn!(ws_id = %ws_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Cleanup.
    controller.close().await;
    state.sessions.remove(&ws_id);
    sender_task.abort();
    debug!(ws_id = %ws_id, "WebSocket connection closed");
}
