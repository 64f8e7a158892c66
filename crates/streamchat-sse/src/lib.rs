// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming transport for streamchat.
//!
//! Decodes `data: ` framed response bodies into payloads ([`frame`]), classifies
//! payloads into text deltas ([`delta`]), and implements the HTTP generation
//! endpoint and token identity provider the engine is wired with.

pub mod auth;
pub mod client;
pub mod delta;
pub mod frame;
pub mod types;

pub use auth::{ACCESS_TOKEN_ENV, TokenCredentials};
pub use client::HttpEndpoint;
pub use delta::{Delta, DeltaExtractor};
pub use frame::{FrameDecoder, MAX_LINE_BYTES};
