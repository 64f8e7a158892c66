// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the streaming generation endpoint.
//!
//! Provides [`HttpEndpoint`] which handles request construction, credential
//! headers, non-2xx error shaping, and hands the successful body to the
//! [`FrameDecoder`](crate::frame::FrameDecoder). Retrying is the engine's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use streamchat_config::model::{EndpointConfig, RequestFormat};
use streamchat_core::{
    Adapter, AdapterType, ChatError, ChatRequest, Credential, GenerationEndpoint, HealthStatus,
    PayloadStream,
};
use tracing::{debug, warn};

use crate::frame;
use crate::types::{ApiErrorBody, RequestBody};

const CORS_HINT: &str = " (CORS: endpoint must allow your origin and headers)";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Generation endpoint reached over HTTP with an SSE response body.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
    format: RequestFormat,
    model: Option<String>,
    reasoning: Option<String>,
    credential_header: HeaderName,
    credential_prefix: String,
    runtime_session_header: HeaderName,
}

impl HttpEndpoint {
    /// Creates a client from the `[endpoint]` config section.
    pub fn new(config: &EndpointConfig) -> Result<Self, ChatError> {
        let credential_header = parse_header_name(&config.credential_header)?;
        let runtime_session_header = parse_header_name(&config.runtime_session_header)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            format: config.request_format,
            model: config.model.clone(),
            reasoning: config.reasoning.clone(),
            credential_header,
            credential_prefix: config.credential_prefix.clone(),
            runtime_session_header,
        })
    }

    /// Returns the configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_headers(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<HeaderMap, ChatError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!(
            "{}{}",
            self.credential_prefix,
            credential.expose()
        ))
        .map_err(|_| ChatError::Auth("credential is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(self.credential_header.clone(), auth);

        let session = HeaderValue::from_str(&request.runtime_session_id)
            .map_err(|e| ChatError::Internal(format!("invalid runtime session id: {e}")))?;
        headers.insert(self.runtime_session_header.clone(), session);

        Ok(headers)
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, ChatError> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| ChatError::Config(format!("invalid header name `{name}`: {e}")))
}

/// Shapes a non-2xx response into a single message.
///
/// Prefers the body's `error`, then its `message`, then the raw body text,
/// then `HTTP <status>: <reason>`.
fn status_message(status: StatusCode, body: &str, allows_origin: bool) -> String {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let mut message = match parsed.as_ref().and_then(ApiErrorBody::best_message) {
        Some(message) => message,
        None if parsed.is_none() && !body.trim().is_empty() => body.trim().to_string(),
        None => {
            let reason = status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| body.trim().to_string());
            format!("HTTP {}: {reason}", status.as_u16())
        }
    };
    if status == StatusCode::FORBIDDEN && !allows_origin {
        message.push_str(CORS_HINT);
    }
    message
}

#[async_trait]
impl Adapter for HttpEndpoint {
    fn name(&self) -> &str {
        "http-endpoint"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Endpoint
    }

    /// Any HTTP answer counts as reachable; only connection failures are unhealthy.
    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        match self
            .client
            .head(&self.url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_server_error() => Ok(HealthStatus::Degraded(
                format!("endpoint answered {}", response.status()),
            )),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("endpoint unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl GenerationEndpoint for HttpEndpoint {
    async fn open_stream(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<PayloadStream, ChatError> {
        let body = RequestBody::build(
            self.format,
            request,
            self.model.as_deref(),
            self.reasoning.as_deref(),
        );
        let headers = self.request_headers(request, credential)?;

        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, url = %self.url, "streaming response received");

        if status.is_success() {
            return Ok(frame::decode_response(response));
        }

        let allows_origin = response
            .headers()
            .contains_key("access-control-allow-origin");
        let text = response.text().await.unwrap_or_default();
        let message = status_message(status, &text, allows_origin);
        warn!(status = %status, error = %message, "endpoint rejected request");

        Err(ChatError::HttpStatus {
            status: status.as_u16(),
            message,
        })
    }
}
