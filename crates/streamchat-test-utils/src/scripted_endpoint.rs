// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted generation endpoint for deterministic testing.
//!
//! Each `open_stream` call pops the next [`Script`]. Byte scripts go through the
//! real [`FrameDecoder`], so chunking, `[DONE]` handling and mid-stream aborts
//! behave exactly as they do over HTTP.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use streamchat_core::{
    Adapter, AdapterType, ChatError, ChatRequest, Credential, GenerationEndpoint, HealthStatus,
    PayloadStream,
};
use streamchat_sse::FrameDecoder;

/// Behavior of one attempt.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond 200 with these raw body chunks.
    Chunks(Vec<Vec<u8>>),
    /// Emit the chunks, then fail the body read.
    ChunksThenAbort(Vec<Vec<u8>>),
    /// Emit the chunks, then never finish.
    ChunksThenHang(Vec<Vec<u8>>),
    /// Non-2xx answer.
    Status { status: u16, message: String },
    /// The connection could not be established.
    ConnectError(String),
}

impl Script {
    /// One chunk holding a `data: ` line per payload.
    pub fn lines<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body: String = payloads
            .into_iter()
            .map(|p| format!("data: {}\n\n", p.as_ref()))
            .collect();
        Script::Chunks(vec![body.into_bytes()])
    }

    /// `{"text": ...}` frames followed by `[DONE]`.
    pub fn text<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut payloads: Vec<String> = fragments
            .into_iter()
            .map(|f| serde_json::json!({ "text": f.as_ref() }).to_string())
            .collect();
        payloads.push("[DONE]".to_string());
        Script::lines(payloads)
    }

    /// A single `{"error": ...}` frame.
    pub fn remote_error(message: &str) -> Self {
        Script::lines([serde_json::json!({ "error": message }).to_string()])
    }

    /// Transient 503.
    pub fn unavailable() -> Self {
        Script::Status {
            status: 503,
            message: "HTTP 503: Service Unavailable".into(),
        }
    }
}

fn decoded(chunks: Vec<Vec<u8>>) -> impl futures::Stream<Item = Result<Vec<u8>, io::Error>> + Send {
    stream::iter(chunks.into_iter().map(Ok))
}

/// `GenerationEndpoint` replaying queued scripts. An empty queue yields an empty stream.
#[derive(Default)]
pub struct ScriptedEndpoint {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<(ChatRequest, String)>>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::from(scripts)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, script: Script) {
        self.scripts.lock().await.push_back(script);
    }

    /// Every request received, with the credential it carried.
    pub async fn requests(&self) -> Vec<(ChatRequest, String)> {
        self.requests.lock().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Adapter for ScriptedEndpoint {
    fn name(&self) -> &str {
        "scripted-endpoint"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Endpoint
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GenerationEndpoint for ScriptedEndpoint {
    async fn open_stream(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<PayloadStream, ChatError> {
        self.requests
            .lock()
            .await
            .push((request.clone(), credential.expose().to_string()));

        let script = self
            .scripts
            .lock()
            .await
            .pop_front()
            .unwrap_or(Script::Chunks(Vec::new()));

        match script {
            Script::Chunks(chunks) => Ok(Box::pin(FrameDecoder::new(decoded(chunks)))),
            Script::ChunksThenAbort(chunks) => {
                let abort = stream::once(async {
                    Err::<Vec<u8>, _>(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset",
                    ))
                });
                Ok(Box::pin(FrameDecoder::new(decoded(chunks).chain(abort))))
            }
            Script::ChunksThenHang(chunks) => {
                let hang = stream::pending::<Result<Vec<u8>, io::Error>>();
                Ok(Box::pin(FrameDecoder::new(decoded(chunks).chain(hang))))
            }
            Script::Status { status, message } => Err(ChatError::HttpStatus { status, message }),
            Script::ConnectError(message) => Err(ChatError::transport(message)),
        }
    }
}
