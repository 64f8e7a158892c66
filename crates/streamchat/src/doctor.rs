// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `streamchat doctor` command implementation.
//!
//! Runs the health check of every collaborator the engine would be wired to
//! and prints one line per check.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use colored::Colorize;
use streamchat_config::StreamchatConfig;
use streamchat_core::{Adapter, ChatError, HealthStatus};
use streamchat_sse::{HttpEndpoint, TokenCredentials};
use streamchat_storage::SqliteStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `streamchat doctor` command. `plain` disables colored output.
pub async fn run_doctor(config: &StreamchatConfig, plain: bool) -> Result<(), ChatError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        CheckResult::new("Configuration", CheckStatus::Pass, "valid", Instant::now()),
        check_adapter("Credentials", &TokenCredentials::new(&config.auth)).await,
        check_endpoint(config).await,
        check_database(config).await,
    ];

    println!();
    println!("  streamchat doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn from_health(name: &str, health: Result<HealthStatus, ChatError>, start: Instant) -> CheckResult {
    match health {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "healthy", start),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new(name, CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new(name, CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_adapter(name: &str, adapter: &dyn Adapter) -> CheckResult {
    let start = Instant::now();
    from_health(name, adapter.health_check().await, start)
}

async fn check_endpoint(config: &StreamchatConfig) -> CheckResult {
    let start = Instant::now();
    match HttpEndpoint::new(&config.endpoint) {
        Ok(endpoint) => {
            let mut result = check_adapter("Endpoint", &endpoint).await;
            if result.status == CheckStatus::Pass {
                result.message = format!("reachable: {}", endpoint.url());
            }
            result
        }
        Err(e) => CheckResult::new("Endpoint", CheckStatus::Fail, e.to_string(), start),
    }
}

/// A missing database only warns; the first real command creates it.
async fn check_database(config: &StreamchatConfig) -> CheckResult {
    let start = Instant::now();
    let path = &config.storage.database_path;
    if !std::path::Path::new(path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {path} (will be created on first use)"),
            start,
        );
    }

    match SqliteStore::open(&config.storage).await {
        Ok(store) => {
            let result = from_health("Database", store.health_check().await, start);
            let _ = store.close().await;
            result
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    }
}
