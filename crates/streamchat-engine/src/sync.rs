// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort mirroring of the transcript into the durable store.
//!
//! Store failures never fail a chat exchange: write paths log and report
//! whether the write happened, read paths return the error for the caller to
//! degrade on.

use std::sync::Arc;

use streamchat_core::{
    ChatError, ConversationStore, Feedback, MessageId, MessageRecord, MessageUpdate, SessionId,
    SessionRecord,
};
use tracing::{debug, info, warn};

/// Visible characters kept from the first prompt when naming a session.
const SESSION_NAME_CHARS: usize = 50;

/// Session display name: the first prompt cut to 50 characters, `...` if cut.
pub fn derive_session_name(first_prompt: &str) -> String {
    let mut chars = first_prompt.chars();
    let head: String = chars.by_ref().take(SESSION_NAME_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Thin policy layer over an injected [`ConversationStore`].
#[derive(Clone)]
pub struct PersistenceSync {
    store: Arc<dyn ConversationStore>,
}

impl PersistenceSync {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Makes sure a session record exists. Check-then-create without a lock:
    /// two racing callers may both create one, which is accepted.
    pub async fn ensure_session(&self, session_id: &SessionId, first_prompt: &str) -> bool {
        match self.store.list_sessions_by_session_id(session_id).await {
            Ok(existing) if !existing.is_empty() => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "session lookup failed");
                return false;
            }
        }

        let name = derive_session_name(first_prompt);
        match self.store.create_session(session_id, &name).await {
            Ok(record) => {
                info!(session_id = %session_id, record_id = %record.id, name = %record.name, "session created");
                true
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "session creation failed");
                false
            }
        }
    }

    /// Creates the near-empty record for a new pair. `None` means degraded mode:
    /// the pair streams normally but cannot be finalized or rated.
    pub async fn create_placeholder(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Option<MessageId> {
        match self.store.create_message(session_id, user_text, "").await {
            Ok(record) => {
                debug!(session_id = %session_id, message_id = %record.id, "placeholder created");
                Some(record.id)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "placeholder creation failed");
                None
            }
        }
    }

    /// Writes the final response text. Skipped without an id or text.
    pub async fn finalize(&self, id: Option<&MessageId>, full_text: &str) -> bool {
        let Some(id) = id else {
            debug!("finalize skipped: no durable id");
            return false;
        };
        if full_text.is_empty() {
            debug!(message_id = %id, "finalize skipped: empty response");
            return false;
        }
        match self
            .store
            .update_message(id, MessageUpdate::response(full_text))
            .await
        {
            Ok(()) => {
                debug!(message_id = %id, chars = full_text.chars().count(), "response finalized");
                true
            }
            Err(e) => {
                warn!(message_id = %id, error = %e, "finalize failed");
                false
            }
        }
    }

    /// Persists feedback. Local state is never rolled back on failure.
    pub async fn update_feedback(&self, id: &MessageId, value: Feedback) -> bool {
        match self
            .store
            .update_message(id, MessageUpdate::feedback(value))
            .await
        {
            Ok(()) => {
                debug!(message_id = %id, feedback = %value, "feedback stored");
                true
            }
            Err(e) => {
                warn!(message_id = %id, error = %e, "feedback update failed");
                false
            }
        }
    }

    /// All records of a session, oldest first. Ties keep store order.
    pub async fn load_records(&self, session_id: &SessionId) -> Result<Vec<MessageRecord>, ChatError> {
        let mut records = self.store.list_messages_by_session(session_id).await?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    /// Deletes every message record of the session, then every session record
    /// carrying its id.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), ChatError> {
        let messages = self.store.list_messages_by_session(session_id).await?;
        for message in &messages {
            self.store.delete_message(&message.id).await?;
        }
        let sessions = self.store.list_sessions_by_session_id(session_id).await?;
        for session in &sessions {
            self.store.delete_session_record(&session.id).await?;
        }
        info!(
            session_id = %session_id,
            messages = messages.len(),
            records = sessions.len(),
            "session deleted"
        );
        Ok(())
    }

    /// All session records, most recently updated first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ChatError> {
        let mut sessions = self.store.list_sessions().await?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}
