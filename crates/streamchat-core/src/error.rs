// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the streamchat workspace.
//!
//! Every failure carries its kind from the point where it is detected, so the
//! retry controller never has to inspect message text to decide what to do.

use thiserror::Error;

/// Classification of an explicit `error` payload sent by the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailure {
    /// A failure that may succeed on another attempt.
    Transient,
    /// A client or initialization failure; retrying cannot help.
    Fatal,
}

/// The primary error type used across all streamchat traits and operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid header value, missing endpoint URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// No credential could be obtained from the identity provider.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Connection failure, timeout, or a stream that aborted mid-flight.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The generation endpoint answered with a non-2xx status.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// A decoded payload carried an explicit `error` field.
    #[error("{message}")]
    Remote {
        message: String,
        failure: RemoteFailure,
    },

    /// A single SSE payload was not valid JSON.
    #[error("malformed frame: {payload}")]
    MalformedFrame {
        payload: String,
        source: serde_json::Error,
    },

    /// Durable store failure (query, connection, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller cancelled the in-flight request.
    #[error("request cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Builds a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        ChatError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any store-side error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ChatError::Storage {
            source: source.into(),
        }
    }

    /// Returns true when another attempt of the same send may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Transport { .. } | ChatError::HttpStatus { .. } => true,
            ChatError::Remote { failure, .. } => *failure == RemoteFailure::Transient,
            ChatError::Config(_)
            | ChatError::Auth(_)
            | ChatError::MalformedFrame { .. }
            | ChatError::Storage { .. }
            | ChatError::Cancelled
            | ChatError::Internal(_) => false,
        }
    }

    /// Renders the single human-readable string shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Auth(message) => format!("Authentication error: {message}"),
            ChatError::Cancelled => "Request cancelled".to_string(),
            ChatError::Transport { message, .. } => format!("Communication error: {message}"),
            other => format!("Communication error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(ChatError::transport("connection reset").is_retryable());
        assert!(
            ChatError::HttpStatus {
                status: 502,
                message: "HTTP 502: Bad Gateway".into()
            }
            .is_retryable()
        );
        assert!(
            ChatError::Remote {
                message: "throttled".into(),
                failure: RemoteFailure::Transient,
            }
            .is_retryable()
        );
    }

    #[test]
    fn terminal_kinds_are_not_retryable() {
        assert!(!ChatError::Auth("no token".into()).is_retryable());
        assert!(!ChatError::Cancelled.is_retryable());
        assert!(!ChatError::Config("bad".into()).is_retryable());
        assert!(
            !ChatError::Remote {
                message: "Failed to initialize agent".into(),
                failure: RemoteFailure::Fatal,
            }
            .is_retryable()
        );
    }

    #[test]
    fn user_messages_never_leak_kind_prefixes() {
        assert_eq!(
            ChatError::transport("timed out").user_message(),
            "Communication error: timed out"
        );
        assert_eq!(
            ChatError::Remote {
                message: "model overloaded".into(),
                failure: RemoteFailure::Transient,
            }
            .user_message(),
            "Communication error: model overloaded"
        );
        assert_eq!(
            ChatError::Auth("token expired".into()).user_message(),
            "Authentication error: token expired"
        );
        assert_eq!(ChatError::Cancelled.user_message(), "Request cancelled");
    }
}
