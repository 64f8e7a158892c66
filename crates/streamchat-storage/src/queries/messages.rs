// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record CRUD operations.

use std::str::FromStr;

use rusqlite::params;
use streamchat_core::{ChatError, Feedback, MessageId, MessageRecord, MessageUpdate, SessionId};

use crate::database::{Database, map_tr_err, now_timestamp};

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let feedback: Option<String> = row.get(4)?;
    Ok(MessageRecord {
        id: MessageId(row.get(0)?),
        session_id: SessionId(row.get(1)?),
        user_message: row.get(2)?,
        ai_response: row.get(3)?,
        feedback: feedback.and_then(|f| Feedback::from_str(&f).ok()),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a new message record with a fresh id.
pub async fn create_message(
    db: &Database,
    session_id: &SessionId,
    user_message: &str,
    ai_response: &str,
) -> Result<MessageRecord, ChatError> {
    let now = now_timestamp();
    let record = MessageRecord {
        id: MessageId(uuid::Uuid::new_v4().to_string()),
        session_id: session_id.clone(),
        user_message: Some(user_message.to_string()),
        ai_response: Some(ai_response.to_string()),
        feedback: None,
        created_at: now.clone(),
        updated_at: now,
    };

    let row = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (id, session_id, user_message, ai_response, feedback, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
                params![
                    row.id.0,
                    row.session_id.0,
                    row.user_message,
                    row.ai_response,
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

/// Apply a partial update. Fields left `None` keep their stored value.
pub async fn update_message(
    db: &Database,
    id: &MessageId,
    update: MessageUpdate,
) -> Result<(), ChatError> {
    let id = id.0.clone();
    let feedback = update.feedback.map(|f| f.to_string());
    let ai_response = update.ai_response;
    let now = now_timestamp();

    let lookup = id.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages
                 SET ai_response = COALESCE(?1, ai_response),
                     feedback = COALESCE(?2, feedback),
                     updated_at = ?3
                 WHERE id = ?4",
                params![ai_response, feedback, now, id],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ChatError::storage(format!("message {lookup} not found")));
    }
    Ok(())
}

/// All records of a session in insertion order.
pub async fn list_messages_by_session(
    db: &Database,
    session_id: &SessionId,
) -> Result<Vec<MessageRecord>, ChatError> {
    let session_id = session_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, user_message, ai_response, feedback, created_at, updated_at
                 FROM messages WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_record)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a record. Deleting a missing record is not an error.
pub async fn delete_message(db: &Database, id: &MessageId) -> Result<(), ChatError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            Ok(())
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
    async fn create_then_list_in_insertion_order() {
        let (db, _dir) = setup_db().await;
        let session = SessionId::from("s-1");

        let first = create_message(&db, &session, "hello", "").await.unwrap();
        let second = create_message(&db, &session, "again", "").await.unwrap();
        create_message(&db, &SessionId::from("s-2"), "other", "")
            .await
            .unwrap();

        let records = list_messages_by_session(&db, &session).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(records[0].user_message.as_deref(), Some("hello"));
        assert_eq!(records[0].ai_response.as_deref(), Some(""));
        assert_eq!(records[0].feedback, None);
    }

    #[tokio::test]
    async fn partial_updates_keep_other_fields() {
        let (db, _dir) = setup_db().await;
        let session = SessionId::from("s-1");
        let record = create_message(&db, &session, "hi", "").await.unwrap();

        update_message(&db, &record.id, MessageUpdate::response("Hello"))
            .await
            .unwrap();
        update_message(&db, &record.id, MessageUpdate::feedback(Feedback::Good))
            .await
            .unwrap();

        let stored = &list_messages_by_session(&db, &session).await.unwrap()[0];
        assert_eq!(stored.ai_response.as_deref(), Some("Hello"));
        assert_eq!(stored.feedback, Some(Feedback::Good));
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn updating_missing_record_fails() {
        let (db, _dir) = setup_db().await;
        let err = update_message(&db, &MessageId::from("nope"), MessageUpdate::response("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Storage { .. }));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let (db, _dir) = setup_db().await;
        let session = SessionId::from("s-1");
        let record = create_message(&db, &session, "hi", "").await.unwrap();
        delete_message(&db, &record.id).await.unwrap();
        delete_message(&db, &record.id).await.unwrap();
        assert!(list_messages_by_session(&db, &session).await.unwrap().is_empty());
    }
}
