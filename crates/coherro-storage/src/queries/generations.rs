// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation record operations.

use coherro_core::CoherroError;
use coherro_core::types::{GenerationRecord, RecordId, TurnId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::now_timestamp;

/// Create a record for `turn_id`; the project is taken from the turn.
pub async fn create_generation_record(
    db: &Database,
    turn_id: &TurnId,
    code: &str,
    explanation: &str,
) -> Result<RecordId, CoherroError> {
    let id = uuid::Uuid::new_v4().to_string();
    let turn = turn_id.0.clone();
    let code = code.to_string();
    let explanation = explanation.to_string();
    let now = now_timestamp();
    let record_id = RecordId(id.clone());

    let inserted = db
        .connection()
        .call(move |conn| {
            let n = conn.execute(
                "INSERT INTO generation_records
                     (id, turn_id, project_id, code, explanation, video_url, created_at, updated_at)
                 SELECT ?1, id, project_id, ?2, ?3, NULL, ?4, ?4
                 FROM conversation_turns WHERE id = ?5",
                params![id, code, explanation, now, turn],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if inserted == 0 {
        return Err(CoherroError::Storage {
            source: format!("conversation turn not found: {turn_id}").into(),
        });
    }
    Ok(record_id)
}

/// Attach the published video URL to a record.
pub async fn update_generation_record(
    db: &Database,
    record_id: &RecordId,
    video_url: &str,
) -> Result<(), CoherroError> {
    let id = record_id.0.clone();
    let video_url = video_url.to_string();
    let now = now_timestamp();

    let updated = db
        .connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE generation_records SET video_url = ?1, updated_at = ?2 WHERE id = ?3",
                params![video_url, now, id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(CoherroError::Storage {
            source: format!("generation record not found: {record_id}").into(),
        });
    }
    Ok(())
}

/// Fetch a record by id.
pub async fn get_generation_record(
    db: &Database,
    record_id: &RecordId,
) -> Result<Option<GenerationRecord>, CoherroError> {
    let id = record_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, turn_id, project_id, code, explanation, video_url, created_at
                 FROM generation_records WHERE id = ?1",
                params![id],
                |row| {
                    Ok(GenerationRecord {
                        id: RecordId(row.get(0)?),
                        turn_id: TurnId(row.get(1)?),
                        project_id: row.get(2)?,
                        code: row.get(3)?,
                        explanation: row.get(4)?,
                        video_url: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::turns::append_turn;
    use coherro_core::types::TurnRole;
    use tempfile::tempdir;

    async fn setup_db_with_turn() -> (Database, TurnId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        let turn = append_turn(&db, "proj-1", TurnRole::User, "draw a circle")
            .await
            .unwrap();
        (db, turn, dir)
    }

    #[tokio::test]
    async fn record_lifecycle() {
        let (db, turn, _dir) = setup_db_with_turn().await;
        let id = create_generation_record(&db, &turn, "code", "Draws a circle.")
            .await
            .unwrap();

        let record = get_generation_record(&db, &id).await.unwrap().unwrap();
        assert_eq!(record.turn_id, turn);
        assert_eq!(record.project_id, "proj-1");
        assert_eq!(record.explanation, "Draws a circle.");
        assert!(record.video_url.is_none());

        update_generation_record(&db, &id, "file:///tmp/v.mp4")
            .await
            .unwrap();
        let record = get_generation_record(&db, &id).await.unwrap().unwrap();
        assert_eq!(record.video_url.as_deref(), Some("file:///tmp/v.mp4"));
    }

    #[tokio::test]
    async fn record_for_unknown_turn_is_rejected() {
        let (db, _turn, _dir) = setup_db_with_turn().await;
        let result = create_generation_record(&db, &TurnId("nope".into()), "c", "e").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn updating_unknown_record_is_an_error() {
        let (db, _turn, _dir) = setup_db_with_turn().await;
        let result = update_generation_record(&db, &RecordId("nope".into()), "u").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let (db, _turn, _dir) = setup_db_with_turn().await;
        assert!(
            get_generation_record(&db, &RecordId("nope".into()))
                .await
                .unwrap()
                .is_none()
        );
    }
}
