// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;

use coherro_core::types::{AdapterType, CompletionRequest, HealthStatus};
use coherro_core::{CoherroError, DeltaStream, PluginAdapter, ProviderAdapter};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these deltas, then end normally.
    Deltas(Vec<String>),
    /// Stream these deltas, then fail the stream with `message`.
    BreakAfter(Vec<String>, String),
    /// Fail before any stream is opened.
    Fail(String),
}

impl MockReply {
    pub fn deltas<S: Into<String>>(deltas: impl IntoIterator<Item = S>) -> Self {
        MockReply::Deltas(deltas.into_iter().map(Into::into).collect())
    }
}

/// A mock provider that replays scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// a single "mock response" delta is returned.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delta_delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
            delta_delay: None,
        }
    }

    /// Sleep this long before every delta.
    pub fn with_delta_delay(mut self, delay: Duration) -> Self {
        self.delta_delay = Some(delay);
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::deltas(["mock response"]))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, CoherroError> {
        self.requests.lock().await.push(request);

        let items: Vec<Result<String, CoherroError>> = match self.next_reply().await {
            MockReply::Deltas(deltas) => deltas.into_iter().map(Ok).collect(),
            MockReply::BreakAfter(deltas, message) => deltas
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(CoherroError::Provider {
                    message,
                    source: None,
                })))
                .collect(),
            MockReply::Fail(message) => {
                return Err(CoherroError::Provider {
                    message,
                    source: None,
                });
            }
        };

        match self.delta_delay {
            Some(delay) => Ok(Box::pin(stream::iter(items).then(move |item| async move {
                tokio::time::sleep(delay).await;
                item
            }))),
            None => Ok(Box::pin(stream::iter(items))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_instruction: None,
            turns: Vec::new(),
            max_output_tokens: 100,
        }
    }

    async fn collect(stream: DeltaStream) -> Vec<Result<String, CoherroError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn replies_are_replayed_in_order() {
        let provider = MockProvider::with_replies(vec![
            MockReply::deltas(["a", "b"]),
            MockReply::deltas(["c"]),
        ]);
        let first = collect(provider.stream_completion(request()).await.unwrap()).await;
        let second = collect(provider.stream_completion(request()).await.unwrap()).await;
        assert_eq!(first.len(), 2);
        assert_eq!(second[0].as_ref().unwrap(), "c");
        assert_eq!(provider.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn empty_queue_returns_default() {
        let provider = MockProvider::new();
        let items = collect(provider.stream_completion(request()).await.unwrap()).await;
        assert_eq!(items[0].as_ref().unwrap(), "mock response");
    }

    #[tokio::test]
    async fn break_after_ends_with_error() {
        let provider =
            MockProvider::with_replies(vec![MockReply::BreakAfter(vec!["x".into()], "gone".into())]);
        let items = collect(provider.stream_completion(request()).await.unwrap()).await;
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(CoherroError::Provider { .. })));
    }

    #[tokio::test]
    async fn fail_rejects_the_request() {
        let provider = MockProvider::with_replies(vec![MockReply::Fail("nope".into())]);
        assert!(provider.stream_completion(request()).await.is_err());
    }
}
