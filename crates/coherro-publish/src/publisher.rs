// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moves a rendered video to durable storage.
//!
//! Uploads go to the configured [`ObjectStore`]. Without one, or when the
//! upload fails, the file is moved into the local artifact directory instead;
//! that degraded mode is not an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use coherro_config::CoherroConfig;
use coherro_core::types::{ArtifactKey, PublishedArtifact, StorageKind};
use coherro_core::{CoherroError, ObjectStore};
use coherro_render::RenderArtifact;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::s3::{S3ObjectStore, S3Settings};

const CONTENT_TYPE: &str = "video/mp4";

/// Publishes render artifacts remotely, or locally as a fallback.
pub struct ArtifactPublisher {
    store: Option<Arc<dyn ObjectStore>>,
    local_dir: PathBuf,
    key_prefix: String,
    upload_timeout: Duration,
}

impl ArtifactPublisher {
    pub fn new(
        store: Option<Arc<dyn ObjectStore>>,
        local_dir: PathBuf,
        key_prefix: impl Into<String>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            store,
            local_dir,
            key_prefix: key_prefix.into(),
            upload_timeout,
        }
    }

    /// Build a publisher from configuration, with an S3 store when one is configured.
    pub fn from_config(config: &CoherroConfig) -> Result<Self, CoherroError> {
        let store: Option<Arc<dyn ObjectStore>> = match S3Settings::resolve(&config.object_store)
        {
            Some(settings) => {
                info!(bucket = %settings.bucket, region = %settings.region, "object store configured");
                Some(Arc::new(S3ObjectStore::new(settings)?))
            }
            None => {
                info!("no object store configured, videos will be kept locally");
                None
            }
        };
        Ok(Self::new(
            store,
            config.publish.local_dir.clone(),
            config.publish.key_prefix.clone(),
            Duration::from_secs(config.publish.upload_timeout_secs),
        ))
    }

    pub fn has_remote_store(&self) -> bool {
        self.store.is_some()
    }

    /// The remote store, when one is configured.
    pub fn object_store(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.store.as_ref()
    }

    /// Publish `artifact` under `key`.
    ///
    /// Consumes the artifact: its workspace is removed once the video has been
    /// uploaded or moved.
    pub async fn publish(
        &self,
        artifact: RenderArtifact,
        key: &ArtifactKey,
        cancel: &CancellationToken,
    ) -> Result<PublishedArtifact, CoherroError> {
        let key = ArtifactKey::new(
            path_component(&key.project_id),
            path_component(&key.request_id),
        );

        if let Some(store) = &self.store {
            let object_key = key.object_key(&self.key_prefix);
            match self.upload(store.as_ref(), &object_key, artifact.local_path(), cancel).await {
                Ok(url) => {
                    info!(key = %object_key, "video uploaded");
                    return Ok(PublishedArtifact {
                        url,
                        storage_kind: StorageKind::Remote,
                    });
                }
                Err(CoherroError::Cancelled) => return Err(CoherroError::Cancelled),
                Err(e) => warn!(key = %object_key, error = %e, "upload failed, keeping video locally"),
            }
        }

        self.keep_locally(&artifact, &key).await
    }

    async fn upload(
        &self,
        store: &dyn ObjectStore,
        object_key: &str,
        local_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, CoherroError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| CoherroError::publish("failed to read rendered video", e))?;

        tokio::select! {
            result = tokio::time::timeout(
                self.upload_timeout,
                store.put_object(object_key, bytes, CONTENT_TYPE),
            ) => match result {
                Ok(Ok(())) => Ok(store.object_url(object_key)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(CoherroError::Timeout { duration: self.upload_timeout }),
            },
            _ = cancel.cancelled() => Err(CoherroError::Cancelled),
        }
    }

    async fn keep_locally(
        &self,
        artifact: &RenderArtifact,
        key: &ArtifactKey,
    ) -> Result<PublishedArtifact, CoherroError> {
        let dir = std::path::absolute(self.local_dir.join(&key.project_id))
            .map_err(|e| CoherroError::publish("failed to resolve local video directory", e))?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoherroError::publish("failed to create local video directory", e))?;

        let dest = dir.join(format!("{}.mp4", key.request_id));
        move_file(artifact.local_path(), &dest)
            .await
            .map_err(|e| CoherroError::publish("failed to store video locally", e))?;

        info!(path = %dest.display(), "video stored locally");
        Ok(PublishedArtifact {
            url: format!("file://{}", dest.display()),
            storage_kind: StorageKind::Local,
        })
    }
}

/// Rename, or copy then delete when source and destination are on different filesystems.
async fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(src, dest).await?;
            tokio::fs::remove_file(src).await
        }
    }
}

/// Restrict an id to characters safe in both object keys and file names.
fn path_component(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_made_path_safe() {
        assert_eq!(path_component("proj-1"), "proj-1");
        assert_eq!(path_component("../etc/passwd"), ".._etc_passwd");
        assert_eq!(path_component(".."), "_");
        assert_eq!(path_component("a b/c"), "a_b_c");
    }

    #[tokio::test]
    async fn move_file_relocates_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.mp4");
        let dest = dir.path().join("b.mp4");
        std::fs::write(&src, b"x").unwrap();
        move_file(&src, &dest).await.unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"x");
    }
}
