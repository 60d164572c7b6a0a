// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn operations.

use std::str::FromStr;

use coherro_core::CoherroError;
use coherro_core::types::{ConversationTurn, TurnId, TurnRole};
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{Database, map_tr_err};
use crate::queries::now_timestamp;

/// Append a turn to a project's conversation and return its id.
pub async fn append_turn(
    db: &Database,
    project_id: &str,
    role: TurnRole,
    content: &str,
) -> Result<TurnId, CoherroError> {
    let id = uuid::Uuid::new_v4().to_string();
    let project_id = project_id.to_string();
    let content = content.to_string();
    let created_at = now_timestamp();
    let turn_id = TurnId(id.clone());

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_turns (id, project_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, project_id, role.to_string(), content, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(turn_id)
}

/// All turns of a project in insertion order.
pub async fn list_turns(
    db: &Database,
    project_id: &str,
) -> Result<Vec<ConversationTurn>, CoherroError> {
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, role, content, seq, created_at
                 FROM conversation_turns WHERE project_id = ?1
                 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![project_id], |row| {
                let role: String = row.get(2)?;
                let role = TurnRole::from_str(&role).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                })?;
                Ok(ConversationTurn {
                    id: TurnId(row.get(0)?),
                    project_id: row.get(1)?,
                    role,
                    content: row.get(3)?,
                    sequence: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut turns = Vec::new();
            for row in rows {
                turns.push(row?);
            }
            Ok(turns)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn turns_are_listed_oldest_first() {
        let (db, _dir) = setup_db().await;
        let first = append_turn(&db, "proj-1", TurnRole::User, "draw a circle")
            .await
            .unwrap();
        append_turn(&db, "proj-1", TurnRole::Model, "<code>c</code>")
            .await
            .unwrap();
        append_turn(&db, "proj-1", TurnRole::User, "make it red")
            .await
            .unwrap();

        let turns = list_turns(&db, "proj-1").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].id, first);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Model);
        assert_eq!(turns[2].content, "make it red");
        assert!(turns.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[tokio::test]
    async fn projects_are_isolated() {
        let (db, _dir) = setup_db().await;
        append_turn(&db, "a", TurnRole::User, "one").await.unwrap();
        append_turn(&db, "b", TurnRole::User, "two").await.unwrap();

        let turns = list_turns(&db, "a").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "one");
        assert!(list_turns(&db, "missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn turn_ids_are_unique() {
        let (db, _dir) = setup_db().await;
        let a = append_turn(&db, "p", TurnRole::User, "x").await.unwrap();
        let b = append_turn(&db, "p", TurnRole::User, "x").await.unwrap();
        assert_ne!(a, b);
    }
}
