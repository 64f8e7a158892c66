// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation store for deterministic testing.
//!
//! `MemoryStore` implements `ConversationStore` over plain vectors, records every
//! call, and can be told to fail individual operations. Message listings come
//! back newest first so callers that rely on store ordering are caught.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use streamchat_core::{
    Adapter, AdapterType, ChatError, ConversationStore, HealthStatus, MessageId, MessageRecord,
    MessageUpdate, SessionId, SessionRecord,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateMessage,
    UpdateMessage,
    ListMessages,
    DeleteMessage,
    CreateSession,
    ListSessionsBySessionId,
    ListSessions,
    DeleteSessionRecord,
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateMessage {
        session_id: SessionId,
        user_message: String,
    },
    UpdateMessage {
        id: MessageId,
        update: MessageUpdate,
    },
    ListMessages(SessionId),
    DeleteMessage(MessageId),
    CreateSession {
        session_id: SessionId,
        name: String,
    },
    ListSessionsBySessionId(SessionId),
    ListSessions,
    DeleteSessionRecord(String),
}

#[derive(Default)]
struct State {
    messages: Vec<MessageRecord>,
    sessions: Vec<SessionRecord>,
    calls: Vec<StoreCall>,
    failing: HashSet<StoreOp>,
    update_delay: Option<Duration>,
    seq: i64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{}", self.seq)
    }

    /// Monotonic timestamps, one millisecond apart.
    fn next_timestamp(&mut self) -> String {
        self.seq += 1;
        let base = chrono::DateTime::<chrono::Utc>::from_timestamp(1_767_225_600, 0)
            .unwrap_or_default();
        (base + chrono::Duration::milliseconds(self.seq))
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }

    fn check(&self, op: StoreOp) -> Result<(), ChatError> {
        if self.failing.contains(&op) {
            Err(ChatError::storage(format!("injected failure: {op:?}")))
        } else {
            Ok(())
        }
    }
}

/// In-memory `ConversationStore`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail until [`heal`](Self::heal) is called.
    pub async fn fail(&self, op: StoreOp) {
        self.state.lock().await.failing.insert(op);
    }

    pub async fn heal(&self, op: StoreOp) {
        self.state.lock().await.failing.remove(&op);
    }

    /// Delay every `update_message` call (use with paused tokio time).
    pub async fn set_update_delay(&self, delay: Duration) {
        self.state.lock().await.update_delay = Some(delay);
    }

    /// Insert a record as-is, bypassing the call log.
    pub async fn seed_message(&self, record: MessageRecord) {
        self.state.lock().await.messages.push(record);
    }

    pub async fn seed_session(&self, record: SessionRecord) {
        self.state.lock().await.sessions.push(record);
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn messages(&self) -> Vec<MessageRecord> {
        self.state.lock().await.messages.clone()
    }

    pub async fn sessions(&self) -> Vec<SessionRecord> {
        self.state.lock().await.sessions.clone()
    }

    /// Recorded `update_message` calls that wrote a response text.
    pub async fn finalize_calls(&self) -> Vec<(MessageId, String)> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::UpdateMessage { id, update } => update
                    .ai_response
                    .as_ref()
                    .map(|text| (id.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    pub async fn count(&self, op: StoreOp) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call_op(call) == op)
            .count()
    }
}

fn call_op(call: &StoreCall) -> StoreOp {
    match call {
        StoreCall::CreateMessage { .. } => StoreOp::CreateMessage,
        StoreCall::UpdateMessage { .. } => StoreOp::UpdateMessage,
        StoreCall::ListMessages(_) => StoreOp::ListMessages,
        StoreCall::DeleteMessage(_) => StoreOp::DeleteMessage,
        StoreCall::CreateSession { .. } => StoreOp::CreateSession,
        StoreCall::ListSessionsBySessionId(_) => StoreOp::ListSessionsBySessionId,
        StoreCall::ListSessions => StoreOp::ListSessions,
        StoreCall::DeleteSessionRecord(_) => StoreOp::DeleteSessionRecord,
    }
}

#[async_trait]
impl Adapter for MemoryStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_message(
        &self,
        session_id: &SessionId,
        user_message: &str,
        ai_response: &str,
    ) -> Result<MessageRecord, ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::CreateMessage {
            session_id: session_id.clone(),
            user_message: user_message.to_string(),
        });
        state.check(StoreOp::CreateMessage)?;

        let now = state.next_timestamp();
        let record = MessageRecord {
            id: MessageId(state.next_id("msg")),
            session_id: session_id.clone(),
            user_message: Some(user_message.to_string()),
            ai_response: Some(ai_response.to_string()),
            feedback: None,
            created_at: now.clone(),
            updated_at: now,
        };
        state.messages.push(record.clone());
        Ok(record)
    }

    async fn update_message(
        &self,
        id: &MessageId,
        update: MessageUpdate,
    ) -> Result<(), ChatError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls.push(StoreCall::UpdateMessage {
                id: id.clone(),
                update: update.clone(),
            });
            state.check(StoreOp::UpdateMessage)?;
            state.update_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        let now = state.next_timestamp();
        let record = state
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| ChatError::storage(format!("message {id} not found")))?;
        if let Some(text) = update.ai_response {
            record.ai_response = Some(text);
        }
        if let Some(feedback) = update.feedback {
            record.feedback = Some(feedback);
        }
        record.updated_at = now;
        Ok(())
    }

    async fn list_messages_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::ListMessages(session_id.clone()));
        state.check(StoreOp::ListMessages)?;
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::DeleteMessage(id.clone()));
        state.check(StoreOp::DeleteMessage)?;
        state.messages.retain(|m| &m.id != id);
        Ok(())
    }

    async fn create_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<SessionRecord, ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::CreateSession {
            session_id: session_id.clone(),
            name: name.to_string(),
        });
        state.check(StoreOp::CreateSession)?;

        let now = state.next_timestamp();
        let record = SessionRecord {
            id: state.next_id("sess"),
            session_id: session_id.clone(),
            name: name.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        state.sessions.push(record.clone());
        Ok(record)
    }

    async fn list_sessions_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<SessionRecord>, ChatError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(StoreCall::ListSessionsBySessionId(session_id.clone()));
        state.check(StoreOp::ListSessionsBySessionId)?;
        Ok(state
            .sessions
            .iter()
            .filter(|s| &s.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ChatError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::ListSessions);
        state.check(StoreOp::ListSessions)?;
        Ok(state.sessions.clone())
    }

    async fn delete_session_record(&self, record_id: &str) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(StoreCall::DeleteSessionRecord(record_id.to_string()));
        state.check(StoreOp::DeleteSessionRecord)?;
        state.sessions.retain(|s| s.id != record_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_failures_are_logged_and_returned() {
        let store = MemoryStore::new();
        store.fail(StoreOp::CreateMessage).await;
        let session = SessionId::from("s");
        assert!(store.create_message(&session, "hi", "").await.is_err());
        assert_eq!(store.count(StoreOp::CreateMessage).await, 1);
        assert!(store.messages().await.is_empty());

        store.heal(StoreOp::CreateMessage).await;
        assert!(store.create_message(&session, "hi", "").await.is_ok());
    }

    #[tokio::test]
    async fn timestamps_increase() {
        let store = MemoryStore::new();
        let session = SessionId::from("s");
        let a = store.create_message(&session, "a", "").await.unwrap();
        let b = store.create_message(&session, "b", "").await.unwrap();
        assert!(a.created_at < b.created_at);
    }
}
