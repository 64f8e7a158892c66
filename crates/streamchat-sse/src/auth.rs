// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access-token identity provider.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use streamchat_config::model::AuthConfig;
use streamchat_core::{
    Adapter, AdapterType, ChatError, Credential, CredentialProvider, HealthStatus,
};

/// Environment variable consulted when no token is configured.
pub const ACCESS_TOKEN_ENV: &str = "STREAMCHAT_ACCESS_TOKEN";

/// Hands out a bearer token from config, falling back to the environment.
///
/// The environment is read on every call so a rotated token is picked up by
/// the next attempt.
pub struct TokenCredentials {
    configured: Option<SecretString>,
}

impl TokenCredentials {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            configured: config
                .access_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| SecretString::from(t.to_string())),
        }
    }
}

/// Resolves the token from config or environment.
fn resolve_token(configured: Option<&SecretString>) -> Result<Credential, ChatError> {
    if let Some(token) = configured {
        return Ok(Credential::new(token.expose_secret()));
    }

    match std::env::var(ACCESS_TOKEN_ENV) {
        Ok(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(ChatError::Auth(format!(
            "no access token found. Set auth.access_token in config or the {ACCESS_TOKEN_ENV} environment variable"
        ))),
    }
}

#[async_trait]
impl Adapter for TokenCredentials {
    fn name(&self) -> &str {
        "token"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatError> {
        match resolve_token(self.configured.as_ref()) {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl CredentialProvider for TokenCredentials {
    async fn credential(&self) -> Result<Credential, ChatError> {
        resolve_token(self.configured.as_ref())
    }
}
