// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side session protocol engine for streaming chat.
//!
//! Integrates:
//! - **Transcript**: ordered turns with a single open assistant turn
//! - **Retry**: exponential backoff over one logical send
//! - **Persistence sync**: best-effort placeholder/finalize/feedback writes

pub mod engine;
pub mod retry;
pub mod sync;
pub mod transcript;

pub use engine::{
    ChatEngine, EngineEvent, EngineOptions, FeedbackReceipt, SendOutcome, new_runtime_session_id,
};
pub use retry::{RetryPolicy, SendState};
pub use sync::{PersistenceSync, derive_session_name};
pub use transcript::Transcript;
