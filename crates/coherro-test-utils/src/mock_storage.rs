// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter.
//!
//! Follows the same contract as the SQLite adapter: turns are ordered by a
//! monotonic sequence, and generation records must reference an existing turn.

use async_trait::async_trait;
use tokio::sync::Mutex;

use coherro_core::types::{
    AdapterType, ConversationTurn, GenerationRecord, HealthStatus, RecordId, TurnId, TurnRole,
};
use coherro_core::{CoherroError, PluginAdapter, StorageAdapter};

#[derive(Default)]
struct Tables {
    turns: Vec<ConversationTurn>,
    records: Vec<GenerationRecord>,
    next_sequence: i64,
}

/// Storage kept entirely in memory. Ids are deterministic (`turn-1`, `record-1`, ...).
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored generation record, oldest first.
    pub async fn records(&self) -> Vec<GenerationRecord> {
        self.tables.lock().await.records.clone()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn storage_error(message: String) -> CoherroError {
    CoherroError::Storage {
        source: message.into(),
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), CoherroError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), CoherroError> {
        Ok(())
    }

    async fn append_turn(
        &self,
        project_id: &str,
        role: TurnRole,
        content: &str,
    ) -> Result<TurnId, CoherroError> {
        let mut tables = self.tables.lock().await;
        tables.next_sequence += 1;
        let sequence = tables.next_sequence;
        let id = TurnId(format!("turn-{sequence}"));
        tables.turns.push(ConversationTurn {
            id: id.clone(),
            project_id: project_id.to_string(),
            role,
            content: content.to_string(),
            sequence,
            created_at: now(),
        });
        Ok(id)
    }

    async fn list_turns(&self, project_id: &str) -> Result<Vec<ConversationTurn>, CoherroError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .turns
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create_generation_record(
        &self,
        turn_id: &TurnId,
        code: &str,
        explanation: &str,
    ) -> Result<RecordId, CoherroError> {
        let mut tables = self.tables.lock().await;
        let project_id = tables
            .turns
            .iter()
            .find(|t| &t.id == turn_id)
            .map(|t| t.project_id.clone())
            .ok_or_else(|| storage_error(format!("turn {} not found", turn_id.0)))?;
        let id = RecordId(format!("record-{}", tables.records.len() + 1));
        tables.records.push(GenerationRecord {
            id: id.clone(),
            turn_id: turn_id.clone(),
            project_id,
            code: code.to_string(),
            explanation: explanation.to_string(),
            video_url: None,
            created_at: now(),
        });
        Ok(id)
    }

    async fn update_generation_record(
        &self,
        record_id: &RecordId,
        video_url: &str,
    ) -> Result<(), CoherroError> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .records
            .iter_mut()
            .find(|r| &r.id == record_id)
            .ok_or_else(|| storage_error(format!("generation record {} not found", record_id.0)))?;
        record.video_url = Some(video_url.to_string());
        Ok(())
    }

    async fn get_generation_record(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<GenerationRecord>, CoherroError> {
        let tables = self.tables.lock().await;
        Ok(tables.records.iter().find(|r| &r.id == record_id).cloned())
    }
}
