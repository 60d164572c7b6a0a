// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for generative model integrations.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::CoherroError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// An ordered, finite stream of text deltas from the model.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, CoherroError>> + Send>>;

/// Adapter for generative model integrations.
///
/// The pipeline treats the model as an opaque source of text deltas: the
/// concatenation of every yielded item is the full response.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Opens a streaming completion over the given conversation.
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, CoherroError>;
}
