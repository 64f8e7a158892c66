// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the streamchat session engine.
//!
//! This crate provides the error taxonomy, the conversation data model, and the
//! collaborator traits (store, generation endpoint, identity provider) that the
//! engine receives through its constructor.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ChatError, RemoteFailure};
pub use types::{
    AdapterType, ChatMessage, ChatRequest, Credential, Feedback, HealthStatus, MessageId,
    MessageRecord, MessageUpdate, Role, SessionId, SessionRecord, Turn,
};

pub use traits::{Adapter, ConversationStore, CredentialProvider, GenerationEndpoint, PayloadStream};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn feedback_display_and_parse_round_trip() {
        for value in [Feedback::Good, Feedback::Bad] {
            let parsed = Feedback::from_str(&value.to_string()).expect("should parse back");
            assert_eq!(parsed, value);
        }
        assert_eq!(Feedback::Good.to_string(), "good");
        assert!(Feedback::from_str("meh").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret-token");
        assert_eq!(credential.expose(), "super-secret-token");
        assert!(!format!("{credential:?}").contains("super-secret"));
    }

    #[test]
    fn new_turns_have_no_id_or_feedback() {
        let user = Turn::user("hello");
        let assistant = Turn::assistant("");
        assert_eq!(user.role, Role::User);
        assert_eq!(assistant.role, Role::Assistant);
        assert!(user.id.is_none() && assistant.feedback.is_none());
    }

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _assert_adapter<T: Adapter>() {}
        fn _assert_store<T: ConversationStore>() {}
        fn _assert_endpoint<T: GenerationEndpoint>() {}
        fn _assert_identity<T: CredentialProvider>() {}
    }
}
