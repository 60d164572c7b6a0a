// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All reads and writes go through tokio-rusqlite's single background thread.
//! Migrations run on a short-lived blocking connection before it is opened.

use std::path::Path;

use coherro_core::CoherroError;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs and
    /// run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, CoherroError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoherroError::Storage {
                    source: Box::new(e),
                })?;
        }

        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CoherroError> {
            let mut conn = rusqlite::Connection::open(&setup_path).map_err(storage_err)?;
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(storage_err)?;
                debug!(mode, "journal mode set");
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CoherroError::Storage {
            source: Box::new(e),
        })??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| CoherroError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

fn storage_err(e: rusqlite::Error) -> CoherroError {
    CoherroError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into CoherroError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CoherroError {
    CoherroError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_dirs_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/dir/coherro.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('conversation_turns', 'generation_records') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, ["conversation_turns", "generation_records"]);
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wal.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("again.db");
        drop(Database::open(db_path.to_str().unwrap(), false).await.unwrap());
        Database::open(db_path.to_str().unwrap(), false).await.unwrap();
    }
}
