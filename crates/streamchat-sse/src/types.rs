// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the generation endpoint.

use serde::{Deserialize, Serialize};
use streamchat_config::model::RequestFormat;
use streamchat_core::{ChatMessage, ChatRequest, Role};

/// JSON body of a chat request. Exactly one of `prompt` or `messages` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl RequestBody {
    /// Builds the body for `request` in the configured format.
    ///
    /// The `messages` format sends the prior closed turns followed by the prompt.
    pub fn build(
        format: RequestFormat,
        request: &ChatRequest,
        model: Option<&str>,
        reasoning: Option<&str>,
    ) -> Self {
        let (prompt, messages) = match format {
            RequestFormat::Prompt => (Some(request.prompt.clone()), None),
            RequestFormat::Messages => {
                let mut messages = request.history.clone();
                messages.push(ChatMessage {
                    role: Role::User,
                    content: request.prompt.clone(),
                });
                (None, Some(messages))
            }
        };
        Self {
            prompt,
            messages,
            model: model.map(String::from),
            reasoning: reasoning.map(String::from),
        }
    }
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The most specific message available: `error` first, then `message`.
    pub fn best_message(&self) -> Option<String> {
        let from_error = self.error.as_ref().and_then(|e| match e {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from),
            _ => None,
        });
        from_error.or_else(|| self.message.clone().filter(|m| !m.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            prompt: "And now?".into(),
            history: vec![
                ChatMessage {
                    role: Role::User,
                    content: "Hi".into(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "Hello".into(),
                },
            ],
            runtime_session_id: "session-1".into(),
        }
    }

    #[test]
    fn prompt_format_omits_history() {
        let body = RequestBody::build(RequestFormat::Prompt, &request(), None, None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "And now?" }));
    }

    #[test]
    fn messages_format_appends_prompt_to_history() {
        let body = RequestBody::build(
            RequestFormat::Messages,
            &request(),
            Some("claude-sonnet"),
            Some("low"),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [
                    { "role": "user", "content": "Hi" },
                    { "role": "assistant", "content": "Hello" },
                    { "role": "user", "content": "And now?" }
                ],
                "model": "claude-sonnet",
                "reasoning": "low"
            })
        );
    }

    #[test]
    fn error_field_takes_precedence_over_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":"quota exceeded","message":"ignored"}"#).unwrap();
        assert_eq!(body.best_message().as_deref(), Some("quota exceeded"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"message":"Forbidden"}"#).unwrap();
        assert_eq!(body.best_message().as_deref(), Some("Forbidden"));

        let body: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.best_message(), None);
    }
}
