// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ConversationStore trait.

use async_trait::async_trait;
use tracing::debug;

use streamchat_config::model::StorageConfig;
use streamchat_core::{
    Adapter, AdapterType, ChatError, ConversationStore, HealthStatus, MessageId, MessageRecord,
    MessageUpdate, SessionId, SessionRecord,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed conversation store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database at the configured path, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, ChatError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    /// Checkpoint the WAL before the process exits.
    pub async fn close(&self) -> Result<(), ChatError> {
        self.db.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl Adapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        let result = self
            .db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        if result == "ok" {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(format!("integrity check: {result}")))
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    // --- Message operations ---

    async fn create_message(
        &self,
        session_id: &SessionId,
        user_message: &str,
        ai_response: &str,
    ) -> Result<MessageRecord, ChatError> {
        queries::messages::create_message(&self.db, session_id, user_message, ai_response).await
    }

    async fn update_message(
        &self,
        id: &MessageId,
        update: MessageUpdate,
    ) -> Result<(), ChatError> {
        queries::messages::update_message(&self.db, id, update).await
    }

    async fn list_messages_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        queries::messages::list_messages_by_session(&self.db, session_id).await
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), ChatError> {
        queries::messages::delete_message(&self.db, id).await
    }

    // --- Session operations ---

    async fn create_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<SessionRecord, ChatError> {
        queries::sessions::create_session(&self.db, session_id, name).await
    }

    async fn list_sessions_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<SessionRecord>, ChatError> {
        queries::sessions::list_sessions_by_session_id(&self.db, session_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ChatError> {
        queries::sessions::list_sessions(&self.db).await
    }

    async fn delete_session_record(&self, record_id: &str) -> Result<(), ChatError> {
        queries::sessions::delete_session_record(&self.db, record_id).await
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
    async fn sqlite_store_implements_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::open(&make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Store);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
    }
}
