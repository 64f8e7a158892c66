// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy and the per-send state machine.
//!
//! A send moves through: Idle -> Sending -> Streaming -> Completed, or on
//! failure Failed -> RetryScheduled -> Sending (while retries remain) or
//! Failed -> Terminal.

use std::time::Duration;

use streamchat_config::model::RetryConfig;
use streamchat_core::ChatError;

/// Exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Wait before the retry that follows failed attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether failed attempt `attempt` (zero-based) gets another try.
    pub fn should_retry(&self, attempt: u32, error: &ChatError) -> bool {
        error.is_retryable() && attempt < self.max_retries
    }
}

/// States of one logical send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// No send in progress.
    Idle,
    /// Obtaining a credential and opening the stream.
    Sending,
    /// Consuming fragments.
    Streaming,
    /// The stream ended cleanly.
    Completed,
    /// The current attempt failed; about to decide on a retry.
    Failed,
    /// Waiting out the backoff before the next attempt.
    RetryScheduled,
    /// Gave up; the error is surfaced.
    Terminal,
}

impl SendState {
    /// States during which the loading flag is set.
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            SendState::Sending
                | SendState::Streaming
                | SendState::Failed
                | SendState::RetryScheduled
        )
    }
}

impl std::fmt::Display for SendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendState::Idle => write!(f, "idle"),
            SendState::Sending => write!(f, "sending"),
            SendState::Streaming => write!(f, "streaming"),
            SendState::Completed => write!(f, "completed"),
            SendState::Failed => write!(f, "failed"),
            SendState::RetryScheduled => write!(f, "retry-scheduled"),
            SendState::Terminal => write!(f, "terminal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamchat_core::RemoteFailure;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let p = policy();
        assert_eq!(p.delay_for(0), Duration::from_millis(1000));
        assert_eq!(p.delay_for(1), Duration::from_millis(2000));
        assert_eq!(p.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn no_retry_once_budget_is_spent() {
        let p = policy();
        let err = ChatError::transport("reset");
        assert!(p.should_retry(0, &err));
        assert!(p.should_retry(2, &err));
        assert!(!p.should_retry(3, &err));
    }

    #[test]
    fn fatal_errors_are_never_retried() {
        let p = policy();
        let fatal = ChatError::Remote {
            message: "Failed to initialize".into(),
            failure: RemoteFailure::Fatal,
        };
        assert!(!p.should_retry(0, &fatal));
        assert!(!p.should_retry(0, &ChatError::Auth("none".into())));
        assert!(!p.should_retry(0, &ChatError::Cancelled));
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let p = policy();
        assert!(p.delay_for(64) >= p.delay_for(10));
    }

    #[test]
    fn defaults_follow_config() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn state_display_and_loading() {
        assert_eq!(SendState::RetryScheduled.to_string(), "retry-scheduled");
        assert!(SendState::Streaming.is_loading());
        assert!(!SendState::Completed.is_loading());
        assert!(!SendState::Terminal.is_loading());
    }
}
