// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the generation pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a persisted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub String);

/// Unique identifier for a persisted generation record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    Provider,
    Storage,
    ObjectStore,
}

/// Author of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TurnRole {
    User,
    Model,
}

/// One immutable entry of a project's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub project_id: String,
    pub role: TurnRole,
    pub content: String,
    /// Monotonic ordering key assigned by the persistence layer.
    pub sequence: i64,
    pub created_at: String,
}

/// Persisted result of one generation, attached to the prompting turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: RecordId,
    pub turn_id: TurnId,
    pub project_id: String,
    pub code: String,
    pub explanation: String,
    pub video_url: Option<String>,
    pub created_at: String,
}

/// A streaming completion request for the model provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction override; `None` uses the provider's configured prompt.
    pub system_instruction: Option<String>,
    /// Full ordered conversation, oldest first.
    pub turns: Vec<ConversationTurn>,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

/// Where a published artifact ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageKind {
    /// Uploaded to the remote object store.
    #[strum(serialize = "REMOTE")]
    Remote,
    /// Kept on local disk because no store is configured or the upload failed.
    #[strum(serialize = "LOCAL")]
    Local,
}

/// A durably retrievable reference to a rendered video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub url: String,
    pub storage_kind: StorageKind,
}

/// Deterministic identity of an artifact, derived from its owning project and request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub project_id: String,
    pub request_id: String,
}

impl ArtifactKey {
    pub fn new(project_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            request_id: request_id.into(),
        }
    }

    /// Object key under the given prefix, e.g. `animations/<project>/<request>.mp4`.
    pub fn object_key(&self, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}/{}.mp4", self.project_id, self.request_id)
        } else {
            format!("{prefix}/{}/{}.mp4", self.project_id, self.request_id)
        }
    }
}

/// What a finished generation request produced, for callers that want the whole result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub full_response: String,
    pub code: String,
    pub explanation: String,
    pub full_text: String,
    pub video_url: String,
    pub used_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn turn_role_round_trips_through_strings() {
        assert_eq!(TurnRole::User.to_string(), "USER");
        assert_eq!(TurnRole::from_str("MODEL").unwrap(), TurnRole::Model);
        assert_eq!(serde_json::to_string(&TurnRole::Model).unwrap(), "\"MODEL\"");
    }

    #[test]
    fn object_key_is_derived_from_project_and_request() {
        let key = ArtifactKey::new("proj-1", "turn-9");
        assert_eq!(key.object_key("animations"), "animations/proj-1/turn-9.mp4");
        assert_eq!(key.object_key("/videos/"), "videos/proj-1/turn-9.mp4");
        assert_eq!(key.object_key(""), "proj-1/turn-9.mp4");
    }

    #[test]
    fn storage_kind_serializes_uppercase() {
        assert_eq!(StorageKind::Local.to_string(), "LOCAL");
        assert_eq!(
            serde_json::to_string(&StorageKind::Remote).unwrap(),
            "\"REMOTE\""
        );
    }

    #[test]
    fn generation_outcome_uses_camel_case() {
        let outcome = GenerationOutcome {
            full_response: "raw".into(),
            code: "c".into(),
            explanation: "e".into(),
            full_text: "c\ne\n".into(),
            video_url: "file:///tmp/x.mp4".into(),
            used_fallback: true,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["fullResponse"], "raw");
        assert_eq!(json["videoUrl"], "file:///tmp/x.mp4");
        assert_eq!(json["usedFallback"], true);
    }
}
