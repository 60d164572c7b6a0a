// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object store trait for durable artifact storage.

use async_trait::async_trait;

use crate::error::CoherroError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for a remote blob store (S3 and compatible services).
#[async_trait]
pub trait ObjectStore: PluginAdapter {
    /// Stores `bytes` under `key`.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CoherroError>;

    /// Public URL under which an object stored at `key` is reachable.
    fn object_url(&self, key: &str) -> String;
}
