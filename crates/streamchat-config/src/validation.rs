// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::StreamchatConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on retries; `2^10` times the base delay is already generous.
const MAX_RETRIES_LIMIT: u32 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &StreamchatConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let url = config.endpoint.url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "endpoint.url must not be empty".to_string(),
        });
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("endpoint.url `{url}` must start with http:// or https://"),
        });
    }

    if config.endpoint.credential_header.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "endpoint.credential_header must not be empty".to_string(),
        });
    }

    if config.endpoint.runtime_session_header.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "endpoint.runtime_session_header must not be empty".to_string(),
        });
    }

    if config.endpoint.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "endpoint.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.retry.retry_delay_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.retry_delay_ms must be greater than 0".to_string(),
        });
    }

    if config.retry.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                config.retry.max_retries
            ),
        });
    }

    if config.retry.fatal_markers.iter().any(|m| m.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "retry.fatal_markers must not contain empty strings".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let level = config.general.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{}` is not one of {}",
                config.general.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
