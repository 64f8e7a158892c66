// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store trait for durable sessions and message records.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::traits::adapter::Adapter;
use crate::types::{MessageId, MessageRecord, MessageUpdate, SessionId, SessionRecord};

/// Record store for sessions and prompt/response pairs.
///
/// Implementations may be eventually consistent and must tolerate concurrent
/// writers. No ordering is guaranteed by the list operations.
#[async_trait]
pub trait ConversationStore: Adapter {
    /// Creates a message record and returns it with its assigned id.
    async fn create_message(
        &self,
        session_id: &SessionId,
        user_message: &str,
        ai_response: &str,
    ) -> Result<MessageRecord, ChatError>;

    async fn update_message(&self, id: &MessageId, update: MessageUpdate)
    -> Result<(), ChatError>;

    async fn list_messages_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<MessageRecord>, ChatError>;

    async fn delete_message(&self, id: &MessageId) -> Result<(), ChatError>;

    async fn create_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<SessionRecord, ChatError>;

    /// Lists every session record carrying the given session id (duplicates included).
    async fn list_sessions_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<SessionRecord>, ChatError>;

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ChatError>;

    /// Deletes one session record by its record id.
    async fn delete_session_record(&self, record_id: &str) -> Result<(), ChatError>;
}
