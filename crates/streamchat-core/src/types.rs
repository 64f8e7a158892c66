// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared across the collaborator traits and the session engine.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Caller-supplied identifier of a conversation. The engine never mints one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

/// Durable identifier of a message record, assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        MessageId(value.to_string())
    }
}

/// Author of a turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// User rating attached to an assistant turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Feedback {
    Good,
    Bad,
}

/// One message of the in-memory transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Durable record id; `None` until the placeholder record is written.
    pub id: Option<MessageId>,
    pub role: Role,
    pub content: String,
    pub feedback: Option<Feedback>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            feedback: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            content: content.into(),
            feedback: None,
        }
    }
}

/// Durable record of one prompt/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub session_id: SessionId,
    pub user_message: Option<String>,
    pub ai_response: Option<String>,
    pub feedback: Option<Feedback>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update applied to a message record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageUpdate {
    pub ai_response: Option<String>,
    pub feedback: Option<Feedback>,
}

impl MessageUpdate {
    pub fn response(text: impl Into<String>) -> Self {
        Self {
            ai_response: Some(text.into()),
            feedback: None,
        }
    }

    pub fn feedback(value: Feedback) -> Self {
        Self {
            ai_response: None,
            feedback: Some(value),
        }
    }
}

/// Durable record describing a session. Several records may share a `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Record id, distinct from the caller-supplied session id.
    pub id: String,
    pub session_id: SessionId,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A prior turn forwarded to the endpoint when the `messages` body format is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Everything the generation endpoint needs for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    /// Closed turns preceding the prompt, oldest first.
    pub history: Vec<ChatMessage>,
    pub runtime_session_id: String,
}

/// Opaque bearer credential handed out by the identity provider.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    Endpoint,
    Identity,
}
