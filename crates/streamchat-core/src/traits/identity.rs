// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider trait.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::traits::adapter::Adapter;
use crate::types::Credential;

/// Supplies a bearer credential on demand.
#[async_trait]
pub trait CredentialProvider: Adapter {
    /// Returns a currently valid credential, or [`ChatError::Auth`].
    async fn credential(&self) -> Result<Credential, ChatError>;
}
