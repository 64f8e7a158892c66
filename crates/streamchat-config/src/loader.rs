// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Hierarchy: `./streamchat.toml` > `~/.config/streamchat/streamchat.toml` >
//! `/etc/streamchat/streamchat.toml`, with `STREAMCHAT_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StreamchatConfig;

pub(crate) const LOCAL_CONFIG_FILE: &str = "streamchat.toml";
pub(crate) const SYSTEM_CONFIG_FILE: &str = "/etc/streamchat/streamchat.toml";

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("streamchat").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/streamchat/streamchat.toml`
/// 3. `~/.config/streamchat/streamchat.toml`
/// 4. `./streamchat.toml`
/// 5. `STREAMCHAT_*` environment variables
pub fn load_config() -> Result<StreamchatConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<StreamchatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreamchatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StreamchatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreamchatConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StreamchatConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_FILE))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `STREAMCHAT_RETRY_MAX_RETRIES` must become `retry.max_retries`.
fn env_provider() -> Env {
    Env::prefixed("STREAMCHAT_")
        // Read by the credential provider, not part of the config tree.
        .ignore(&["access_token"])
        .map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    key.replacen("general_", "general.", 1)
        .replacen("endpoint_", "endpoint.", 1)
        .replacen("retry_", "retry.", 1)
        .replacen("auth_", "auth.", 1)
        .replacen("storage_", "storage.", 1)
}
