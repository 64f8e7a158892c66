// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of decoded SSE payloads into text deltas.
//!
//! Payloads are matched in priority order: a truthy `error` wins over text,
//! flat `{"text": ...}` wins over the nested
//! `event.contentBlockDelta.delta.text` form, and anything else is a status
//! frame. A falsy `error` (null, false, empty string) is ignored.

use serde_json::Value;
use streamchat_core::{ChatError, RemoteFailure};
use tracing::{trace, warn};

const NESTED_TEXT: &str = "/event/contentBlockDelta/delta/text";

/// What a single payload contributes to the assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// Non-empty text to append.
    Fragment(String),
    /// Valid JSON carrying no text (metadata, lifecycle events, empty text).
    Status(Value),
    /// Payload was not valid JSON and is skipped.
    Ignore,
}

/// Stateless payload classifier.
#[derive(Debug, Clone, Default)]
pub struct DeltaExtractor {
    fatal_markers: Vec<String>,
}

impl DeltaExtractor {
    /// Creates an extractor that tags remote errors containing any of
    /// `fatal_markers` (case-insensitive) as non-retryable.
    pub fn new(fatal_markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fatal_markers: fatal_markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .collect(),
        }
    }

    /// Classifies one payload. Only an explicit `error` field produces `Err`.
    pub fn extract(&self, payload: &str) -> Result<Delta, ChatError> {
        let value = match serde_json::from_str::<Value>(payload) {
            Ok(value) => value,
            Err(source) => {
                let err = ChatError::MalformedFrame {
                    payload: payload.to_string(),
                    source,
                };
                warn!(error = %err, "skipping unparseable stream payload");
                return Ok(Delta::Ignore);
            }
        };

        if let Some(error) = value.get("error").filter(|e| is_truthy(e)) {
            let message = error_message(error);
            let failure = self.classify(&message);
            return Err(ChatError::Remote { message, failure });
        }

        let text = value
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| value.pointer(NESTED_TEXT).and_then(Value::as_str));
        match text {
            Some("") => Ok(Delta::Status(value)),
            Some(text) => Ok(Delta::Fragment(text.to_string())),
            None => {
                trace!(payload = %value, "status frame");
                Ok(Delta::Status(value))
            }
        }
    }

    /// Tags a remote error message as fatal when it names a known client failure.
    pub fn classify(&self, message: &str) -> RemoteFailure {
        let lowered = message.to_lowercase();
        if self.fatal_markers.iter().any(|m| lowered.contains(m)) {
            RemoteFailure::Fatal
        } else {
            RemoteFailure::Transient
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(m)) => m.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DeltaExtractor {
        DeltaExtractor::new(["Failed to initialize", "ValidationException"])
    }

    #[test]
    fn flat_text_is_a_fragment() {
        let delta = extractor().extract(r#"{"text":"Hel"}"#).unwrap();
        assert_eq!(delta, Delta::Fragment("Hel".into()));
    }

    #[test]
    fn nested_text_is_a_fragment() {
        let payload = r#"{"event":{"contentBlockDelta":{"delta":{"text":"lo"},"contentBlockIndex":0}}}"#;
        let delta = extractor().extract(payload).unwrap();
        assert_eq!(delta, Delta::Fragment("lo".into()));
    }

    #[test]
    fn flat_form_wins_when_both_present() {
        let payload =
            r#"{"text":"flat","event":{"contentBlockDelta":{"delta":{"text":"nested"}}}}"#;
        assert_eq!(
            extractor().extract(payload).unwrap(),
            Delta::Fragment("flat".into())
        );
    }

    #[test]
    fn error_wins_over_text() {
        let err = extractor()
            .extract(r#"{"error":"throttled","text":"partial"}"#)
            .unwrap_err();
        match err {
            ChatError::Remote { message, failure } => {
                assert_eq!(message, "throttled");
                assert_eq!(failure, RemoteFailure::Transient);
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn error_object_uses_its_message() {
        let err = extractor()
            .extract(r#"{"error":{"message":"Failed to initialize agent","code":500}}"#)
            .unwrap_err();
        match err {
            ChatError::Remote { message, failure } => {
                assert_eq!(message, "Failed to initialize agent");
                assert_eq!(failure, RemoteFailure::Fatal);
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn fatal_markers_match_case_insensitively() {
        assert_eq!(
            extractor().classify("upstream validationexception: bad input"),
            RemoteFailure::Fatal
        );
        assert_eq!(extractor().classify("timeout"), RemoteFailure::Transient);
    }

    #[test]
    fn null_error_is_a_status_frame() {
        assert!(matches!(
            extractor().extract(r#"{"error":null}"#).unwrap(),
            Delta::Status(_)
        ));
    }

    #[test]
    fn falsy_error_keeps_flat_text() {
        for payload in [
            r#"{"error":null,"text":"Hi"}"#,
            r#"{"error":false,"text":"Hi"}"#,
            r#"{"error":"","text":"Hi"}"#,
        ] {
            assert_eq!(
                extractor().extract(payload).unwrap(),
                Delta::Fragment("Hi".into()),
                "{payload}"
            );
        }
    }

    #[test]
    fn falsy_error_keeps_nested_text() {
        let payload = r#"{"error":false,"event":{"contentBlockDelta":{"delta":{"text":"lo"}}}}"#;
        assert_eq!(
            extractor().extract(payload).unwrap(),
            Delta::Fragment("lo".into())
        );
    }

    #[test]
    fn non_string_flat_text_falls_back_to_nested() {
        let payload = r#"{"text":7,"event":{"contentBlockDelta":{"delta":{"text":"lo"}}}}"#;
        assert_eq!(
            extractor().extract(payload).unwrap(),
            Delta::Fragment("lo".into())
        );
    }

    #[test]
    fn empty_text_is_a_status_frame() {
        assert!(matches!(
            extractor().extract(r#"{"text":""}"#).unwrap(),
            Delta::Status(_)
        ));
    }

    #[test]
    fn lifecycle_events_are_status_frames() {
        for payload in [
            r#"{"event":{"messageStart":{"role":"assistant"}}}"#,
            r#"{"init_event_loop":true}"#,
            r#"{"text":42}"#,
            r#""just a string""#,
            "[1,2,3]",
        ] {
            assert!(
                matches!(extractor().extract(payload).unwrap(), Delta::Status(_)),
                "{payload} should be a status frame"
            );
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn invalid_json_is_logged() {
        extractor().extract("{oops").unwrap();
        assert!(logs_contain("skipping unparseable stream payload"));
    }

    #[test]
    fn invalid_json_is_ignored() {
        assert_eq!(extractor().extract("{not json").unwrap(), Delta::Ignore);
        assert_eq!(extractor().extract("hello").unwrap(), Delta::Ignore);
    }
}
