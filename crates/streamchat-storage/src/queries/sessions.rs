// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session record CRUD operations.

use rusqlite::params;
use streamchat_core::{ChatError, SessionId, SessionRecord};

use crate::database::{Database, map_tr_err, now_timestamp};

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        session_id: SessionId(row.get(1)?),
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Create a session record. Duplicate `session_id`s are accepted.
pub async fn create_session(
    db: &Database,
    session_id: &SessionId,
    name: &str,
) -> Result<SessionRecord, ChatError> {
    let now = now_timestamp();
    let record = SessionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: session_id.clone(),
        name: name.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    let row = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO sessions (id, session_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id,
                    row.session_id.0,
                    row.name,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

    Ok(record)
}

/// Every record carrying `session_id`.
pub async fn list_sessions_by_session_id(
    db: &Database,
    session_id: &SessionId,
) -> Result<Vec<SessionRecord>, ChatError> {
    let session_id = session_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<SessionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, name, created_at, updated_at
                 FROM sessions WHERE session_id = ?1
                 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// All session records, most recently updated first.
pub async fn list_sessions(db: &Database) -> Result<Vec<SessionRecord>, ChatError> {
    db.connection()
        .call(|conn| -> Result<Vec<SessionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, name, created_at, updated_at
                 FROM sessions ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map([], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one session record by record id.
pub async fn delete_session_record(db: &Database, record_id: &str) -> Result<(), ChatError> {
    let record_id = record_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![record_id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
