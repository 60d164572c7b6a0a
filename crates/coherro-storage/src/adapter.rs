// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use coherro_config::model::StorageConfig;
use coherro_core::types::{
    AdapterType, ConversationTurn, GenerationRecord, HealthStatus, RecordId, TurnId, TurnRole,
};
use coherro_core::{CoherroError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, CoherroError> {
        self.db.get().ok_or_else(|| CoherroError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), CoherroError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CoherroError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CoherroError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CoherroError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn append_turn(
        &self,
        project_id: &str,
        role: TurnRole,
        content: &str,
    ) -> Result<TurnId, CoherroError> {
        queries::turns::append_turn(self.db()?, project_id, role, content).await
    }

    async fn list_turns(&self, project_id: &str) -> Result<Vec<ConversationTurn>, CoherroError> {
        queries::turns::list_turns(self.db()?, project_id).await
    }

    async fn create_generation_record(
        &self,
        turn_id: &TurnId,
        code: &str,
        explanation: &str,
    ) -> Result<RecordId, CoherroError> {
        queries::generations::create_generation_record(self.db()?, turn_id, code, explanation).await
    }

    async fn update_generation_record(
        &self,
        record_id: &RecordId,
        video_url: &str,
    ) -> Result<(), CoherroError> {
        queries::generations::update_generation_record(self.db()?, record_id, video_url).await
    }

    async fn get_generation_record(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<GenerationRecord>, CoherroError> {
        queries::generations::get_generation_record(self.db()?, record_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        assert!(storage.list_turns("p").await.is_err());
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn generation_flow_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("flow.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let turn = storage
            .append_turn("proj-1", TurnRole::User, "draw a circle")
            .await
            .unwrap();
        let record = storage
            .create_generation_record(&turn, "from manim import *", "Draws a circle.")
            .await
            .unwrap();
        storage
            .append_turn("proj-1", TurnRole::Model, "<code>...</code>")
            .await
            .unwrap();
        storage
            .update_generation_record(&record, "https://cdn/v.mp4")
            .await
            .unwrap();

        let turns = storage.list_turns("proj-1").await.unwrap();
        assert_eq!(turns.len(), 2);
        let stored = storage.get_generation_record(&record).await.unwrap().unwrap();
        assert_eq!(stored.turn_id, turn);
        assert_eq!(stored.video_url.as_deref(), Some("https://cdn/v.mp4"));

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        {
            let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
            storage.initialize().await.unwrap();
            storage
                .append_turn("p", TurnRole::User, "hello")
                .await
                .unwrap();
            storage.shutdown().await.unwrap();
        }
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.list_turns("p").await.unwrap()[0].content, "hello");
    }
}
