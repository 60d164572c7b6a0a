// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory object store.

use std::sync::Mutex;

use async_trait::async_trait;

use coherro_core::types::{AdapterType, HealthStatus};
use coherro_core::{CoherroError, ObjectStore, PluginAdapter};

/// Base URL of objects stored in a [`RecordingObjectStore`].
pub const MOCK_STORE_URL: &str = "https://videos.test";

/// One successful `put_object` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store that keeps uploads in memory, or rejects every upload.
pub struct RecordingObjectStore {
    fail: bool,
    objects: Mutex<Vec<StoredObject>>,
}

impl RecordingObjectStore {
    pub fn new() -> Self {
        Self {
            fail: false,
            objects: Mutex::new(Vec::new()),
        }
    }

    /// A store whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            objects: Mutex::new(Vec::new()),
        }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl Default for RecordingObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for RecordingObjectStore {
    fn name(&self) -> &str {
        "recording-object-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        if self.fail {
            return Ok(HealthStatus::Unhealthy("uploads rejected".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CoherroError> {
        if self.fail {
            return Err(CoherroError::Publish {
                message: "mock upload rejected".into(),
                source: None,
            });
        }
        if let Ok(mut objects) = self.objects.lock() {
            objects.push(StoredObject {
                key: key.to_string(),
                bytes,
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{MOCK_STORE_URL}/{key}")
    }
}
