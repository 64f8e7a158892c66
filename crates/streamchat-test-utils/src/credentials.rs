// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use streamchat_core::{
    Adapter, AdapterType, ChatError, Credential, CredentialProvider, HealthStatus,
};

/// Always hands out the same token and counts how often it was asked.
pub struct StaticCredentials {
    token: String,
    issued: AtomicUsize,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued: AtomicUsize::new(0),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for StaticCredentials {
    fn name(&self) -> &str {
        "static-credentials"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credential(&self) -> Result<Credential, ChatError> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(self.token.clone()))
    }
}

/// Never has a credential.
#[derive(Default)]
pub struct FailingCredentials;

#[async_trait]
impl Adapter for FailingCredentials {
    fn name(&self) -> &str {
        "failing-credentials"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus::Unhealthy("signed out".into()))
    }
}

#[async_trait]
impl CredentialProvider for FailingCredentials {
    async fn credential(&self) -> Result<Credential, ChatError> {
        Err(ChatError::Auth("No access token available".into()))
    }
}
