// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection session controller.
//!
//! A session owns at most one in-flight generation. The request runs on its
//! own task under a child of the session's cancellation token, so closing the
//! session stops the model stream, kills the renderer and aborts uploads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use coherro_core::CoherroError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{COMPLETE_MESSAGE, ClientMessage, EventSink, FAILURE_MESSAGE, ServerEvent};
use crate::pipeline::GenerationPipeline;
use crate::request::GenerationRequest;

/// Drives the event protocol for one connected client.
pub struct SessionController {
    session_id: String,
    pipeline: Arc<GenerationPipeline>,
    events: EventSink,
    busy: Arc<AtomicBool>,
    /// Held while a finishing request emits its terminal event and clears
    /// `busy`, and while a new prompt claims `busy`.
    gate: Arc<tokio::sync::Mutex<()>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Creates a controller whose requests are cancelled with `parent`.
    pub fn new(
        session_id: impl Into<String>,
        pipeline: Arc<GenerationPipeline>,
        events: EventSink,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            pipeline,
            events,
            busy: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(tokio::sync::Mutex::new(())),
            cancel: parent.child_token(),
            task: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// True while a generation is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Handle one inbound text frame.
    ///
    /// Malformed JSON yields an `error` event; unknown message types are ignored.
    pub async fn handle_message(&self, text: &str) {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::Prompt { prompt, project_id }) => {
                self.handle_prompt(&prompt, &project_id).await;
            }
            Ok(ClientMessage::Unknown) => {
                debug!(session_id = %self.session_id, "ignoring unknown message type");
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "malformed client message");
                self.events
                    .emit(ServerEvent::error(format!("Invalid message format: {e}")))
                    .await;
            }
        }
    }

    /// Start a generation for `prompt`, or report why it cannot start.
    pub async fn handle_prompt(&self, prompt: &str, project_id: &str) {
        let request = match GenerationRequest::new(prompt, project_id) {
            Ok(request) => request,
            Err(e) => {
                self.events.emit(ServerEvent::error(client_message(&e))).await;
                return;
            }
        };

        let claimed = {
            let _gate = self.gate.lock().await;
            self.busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        };
        if !claimed {
            info!(session_id = %self.session_id, "rejecting prompt, generation in progress");
            self.events
                .emit(ServerEvent::error(client_message(&CoherroError::SessionBusy)))
                .await;
            return;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let events = self.events.clone();
        let busy = Arc::clone(&self.busy);
        let gate = Arc::clone(&self.gate);
        let cancel = self.cancel.child_token();
        let session_id = self.session_id.clone();

        let handle = tokio::spawn(async move {
            let result = pipeline.run_request(request, &events, &cancel).await;
            // The terminal event is queued before `busy` clears, and a prompt sent in
            // reaction to it waits on the gate until the session is free.
            let _gate = gate.lock().await;
            match result {
                Ok(outcome) => {
                    info!(
                        session_id = %session_id,
                        used_fallback = outcome.used_fallback,
                        "generation complete"
                    );
                    events
                        .emit(ServerEvent::Complete {
                            message: COMPLETE_MESSAGE.into(),
                        })
                        .await;
                }
                Err(e) if e.is_cancelled() => {
                    info!(session_id = %session_id, "generation cancelled");
                }
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "generation failed");
                    events.emit(ServerEvent::error(client_message(&e))).await;
                }
            }
            busy.store(false, Ordering::Release);
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(handle);
        }
    }

    /// Cancel any in-flight request and wait for it to unwind.
    ///
    /// When this returns, the request's workspace has been removed.
    pub async fn close(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(session_id = %self.session_id, error = %e, "generation task ended abnormally");
        }
        debug!(session_id = %self.session_id, "session closed");
    }
}

/// Text sent to the client for an error.
///
/// Input problems are echoed; anything else is reported generically.
pub fn client_message(error: &CoherroError) -> String {
    match error {
        CoherroError::Protocol(message) => format!("Invalid request: {message}"),
        CoherroError::SessionBusy => "A generation is already in progress for this session".into(),
        _ => FAILURE_MESSAGE.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_messages() {
        assert_eq!(
            client_message(&CoherroError::Protocol("prompt must not be empty".into())),
            "Invalid request: prompt must not be empty"
        );
        assert!(client_message(&CoherroError::SessionBusy).contains("already in progress"));
        assert_eq!(
            client_message(&CoherroError::Timeout {
                duration: Duration::from_secs(1)
            }),
            FAILURE_MESSAGE
        );
    }
}
