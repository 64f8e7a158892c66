// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for streamchat integration testing.
//!
//! Provides mock collaborators and a test harness for deterministic,
//! network-free tests of the session engine:
//!
//! - [`MemoryStore`]: in-memory `ConversationStore` with failure injection and a call log
//! - [`ScriptedEndpoint`]: `GenerationEndpoint` replaying raw SSE byte chunks
//! - [`StaticCredentials`] / [`FailingCredentials`]: identity providers
//! - [`TestHarness`]: builder wiring all of the above into a `ChatEngine`

pub mod credentials;
pub mod harness;
pub mod memory_store;
pub mod scripted_endpoint;

pub use credentials::{FailingCredentials, StaticCredentials};
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::{MemoryStore, StoreCall, StoreOp};
pub use scripted_endpoint::{Script, ScriptedEndpoint};
