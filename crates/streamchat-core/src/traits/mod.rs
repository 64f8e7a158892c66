// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits injected into the session engine.
//!
//! All collaborators extend the [`Adapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod endpoint;
pub mod identity;
pub mod store;

pub use adapter::Adapter;
pub use endpoint::{GenerationEndpoint, PayloadStream};
pub use identity::CredentialProvider;
pub use store::ConversationStore;
