// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for conversation and generation persistence.

use async_trait::async_trait;

use crate::error::CoherroError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationTurn, GenerationRecord, RecordId, TurnId, TurnRole};

/// Adapter for persistence backends.
///
/// Implementations must tolerate concurrent appends and updates from
/// independent sessions.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connections, etc.).
    async fn initialize(&self) -> Result<(), CoherroError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CoherroError>;

    /// Appends a new turn to the project's conversation.
    async fn append_turn(
        &self,
        project_id: &str,
        role: TurnRole,
        content: &str,
    ) -> Result<TurnId, CoherroError>;

    /// Lists a project's turns, oldest first.
    async fn list_turns(&self, project_id: &str) -> Result<Vec<ConversationTurn>, CoherroError>;

    /// Records the sanitized code and explanation produced for a turn.
    async fn create_generation_record(
        &self,
        turn_id: &TurnId,
        code: &str,
        explanation: &str,
    ) -> Result<RecordId, CoherroError>;

    /// Attaches the published video location to a generation record.
    async fn update_generation_record(
        &self,
        record_id: &RecordId,
        video_url: &str,
    ) -> Result<(), CoherroError>;

    /// Fetches a generation record by id.
    async fn get_generation_record(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<GenerationRecord>, CoherroError>;
}
