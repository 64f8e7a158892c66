// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use streamchat_core::ChatError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ChatError {
    ChatError::Storage {
        source: Box::new(e),
    }
}

/// Current time in the store's timestamp format (RFC 3339, millisecond precision).
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Journal mode, parent directory, and migrations. Runs on a blocking thread
/// before the async connection is opened.
fn prepare(path: &str, wal_mode: bool) -> Result<(), ChatError> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(ChatError::storage)?;
    }

    let mut conn = rusqlite::Connection::open(path).map_err(ChatError::storage)?;
    if wal_mode {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(ChatError::storage)?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    run_migrations(&mut conn)
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ChatError> {
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || prepare(&owned, wal_mode))
            .await
            .map_err(|e| ChatError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ChatError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA synchronous = NORMAL;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), ChatError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                let _: (i64, i64, i64) = conn.query_row(
                    "PRAGMA wal_checkpoint(TRUNCATE)",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("dir").join("chat.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        assert!(db_path.exists());
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chat.db");
        let path = db_path.to_str().unwrap();
        drop(Database::open(path, false).await.unwrap());
        Database::open(path, false).await.unwrap();
    }

    #[test]
    fn timestamps_have_millisecond_precision() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len());
        assert!(ts.ends_with('Z'));
    }
}
