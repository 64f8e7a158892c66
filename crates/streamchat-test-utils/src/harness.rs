// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for engine integration testing.
//!
//! `TestHarness` wires a [`ChatEngine`] to a [`ScriptedEndpoint`], a
//! [`MemoryStore`] and an identity provider, and keeps handles to all three so
//! tests can inspect what the engine did.

use std::sync::Arc;
use std::time::Duration;

use streamchat_core::{CredentialProvider, SessionId};
use streamchat_engine::{ChatEngine, EngineOptions, RetryPolicy};

use crate::credentials::{FailingCredentials, StaticCredentials};
use crate::memory_store::MemoryStore;
use crate::scripted_endpoint::{Script, ScriptedEndpoint};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    session_id: SessionId,
    scripts: Vec<Script>,
    store: Option<Arc<MemoryStore>>,
    signed_out: bool,
    max_retries: u32,
    retry_delay: Duration,
    fatal_markers: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let defaults = EngineOptions::default();
        Self {
            session_id: SessionId::from("session-test"),
            scripts: Vec::new(),
            store: None,
            signed_out: false,
            max_retries: defaults.retry.max_retries,
            retry_delay: defaults.retry.base_delay,
            fatal_markers: defaults.fatal_markers,
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = SessionId::from(session_id);
        self
    }

    /// Queue endpoint behavior, one script per attempt.
    pub fn with_scripts(mut self, scripts: Vec<Script>) -> Self {
        self.scripts = scripts;
        self
    }

    /// Share an existing store (e.g. pre-seeded, or across two engines).
    pub fn with_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an identity provider that never has a credential.
    pub fn signed_out(mut self) -> Self {
        self.signed_out = true;
        self
    }

    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    pub fn with_fatal_markers(mut self, markers: &[&str]) -> Self {
        self.fatal_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn build(self) -> TestHarness {
        let endpoint = Arc::new(ScriptedEndpoint::with_scripts(self.scripts));
        let store = self.store.unwrap_or_default();
        let credentials = Arc::new(StaticCredentials::new("test-token"));
        let provider: Arc<dyn CredentialProvider> = if self.signed_out {
            Arc::new(FailingCredentials)
        } else {
            credentials.clone()
        };

        let options = EngineOptions {
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: self.retry_delay,
            },
            fatal_markers: self.fatal_markers,
        };
        let engine = ChatEngine::new(
            self.session_id,
            endpoint.clone(),
            provider,
            store.clone(),
            options,
        );

        TestHarness {
            engine,
            endpoint,
            store,
            credentials,
        }
    }
}

/// A fully wired engine plus handles to its collaborators.
pub struct TestHarness {
    pub engine: ChatEngine,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub store: Arc<MemoryStore>,
    pub credentials: Arc<StaticCredentials>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Contents of every turn, in order.
    pub fn contents(&self) -> Vec<String> {
        self.engine
            .transcript()
            .turns()
            .iter()
            .map(|t| t.content.clone())
            .collect()
    }
}
