// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation endpoint trait: one request in, one stream of SSE payloads out.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ChatError;
use crate::traits::adapter::Adapter;
use crate::types::{ChatRequest, Credential};

/// Ordered, finite stream of decoded SSE payload strings (`data: ` prefix removed,
/// `[DONE]` already consumed).
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Remote text-generation service replying with Server-Sent Events.
#[async_trait]
pub trait GenerationEndpoint: Adapter {
    /// Sends the request and returns the decoded payload stream.
    ///
    /// Non-2xx responses fail here with [`ChatError::HttpStatus`]; failures while
    /// reading the body surface as items of the returned stream.
    async fn open_stream(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<PayloadStream, ChatError>;
}
