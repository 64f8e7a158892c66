// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that every collaborator implements.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and health reporting shared by stores, endpoints and identity providers.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ChatError>;
}
