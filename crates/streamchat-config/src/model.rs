// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level streamchat configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Generation endpoint and request construction.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Retry and backoff policy for one logical send.
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Durable conversation store.
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Shape of the JSON request body sent to the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestFormat {
    /// `{ "prompt": "..." }`
    #[default]
    Prompt,
    /// `{ "messages": [{ "role": "...", "content": "..." }] }`
    Messages,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// URL receiving the `POST` chat-completion request.
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// Optional model identifier forwarded in the body.
    #[serde(default)]
    pub model: Option<String>,

    /// Optional reasoning setting forwarded in the body.
    #[serde(default)]
    pub reasoning: Option<String>,

    #[serde(default)]
    pub request_format: RequestFormat,

    /// Header carrying the credential.
    #[serde(default = "default_credential_header")]
    pub credential_header: String,

    /// Prefix prepended to the credential value (e.g. `"Bearer "`).
    #[serde(default = "default_credential_prefix")]
    pub credential_prefix: String,

    /// Header carrying the per-engine runtime session identifier.
    #[serde(default = "default_runtime_session_header")]
    pub runtime_session_header: String,

    /// Whole-request timeout, stream included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            model: None,
            reasoning: None,
            request_format: RequestFormat::default(),
            credential_header: default_credential_header(),
            credential_prefix: default_credential_prefix(),
            runtime_session_header: default_runtime_session_header(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:8080/invocations".to_string()
}

fn default_credential_header() -> String {
    "Authorization".to_string()
}

fn default_credential_prefix() -> String {
    "Bearer ".to_string()
}

fn default_runtime_session_header() -> String {
    "X-Runtime-Session-Id".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff; attempt `i` waits `retry_delay_ms * 2^i`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Substrings of remote error messages marking a client/initialization
    /// failure that must not be retried.
    #[serde(default = "default_fatal_markers")]
    pub fatal_markers: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            fatal_markers: default_fatal_markers(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_fatal_markers() -> Vec<String> {
    [
        "Failed to initialize",
        "initialization failed",
        "ValidationException",
        "AccessDeniedException",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Access token. `None` falls back to the `STREAMCHAT_ACCESS_TOKEN` env var.
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("streamchat").join("streamchat.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "streamchat.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}
