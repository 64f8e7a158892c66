// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session protocol engine.
//!
//! One [`ChatEngine`] drives one conversation: it appends the optimistic turn
//! pair before any network call, streams fragments into the open assistant turn,
//! retries transient failures with exponential backoff, and mirrors the result
//! into the durable store on a best-effort basis.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use streamchat_config::model::RetryConfig;
use streamchat_core::{
    ChatError, ChatRequest, ConversationStore, CredentialProvider, Feedback, GenerationEndpoint,
    MessageId, SessionId, SessionRecord,
};
use streamchat_sse::{Delta, DeltaExtractor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::{RetryPolicy, SendState};
use crate::sync::PersistenceSync;
use crate::transcript::Transcript;

/// Result of one logical send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The prompt was empty or whitespace; nothing happened.
    Skipped,
    /// The stream completed and the response is in the transcript.
    Completed,
    /// All attempts failed; carries the user-visible message.
    Failed(String),
}

/// Live notifications for a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A user turn and an empty assistant turn were appended.
    PairAppended { index: usize, prompt: String },
    /// Text appended to the open assistant turn.
    Fragment(String),
    /// A failed attempt will be retried after `delay`; its fragments were discarded.
    Retrying { attempt: u32, delay: Duration },
    StateChanged(SendState),
    /// The user-visible error of a failed send.
    Error(String),
    FeedbackChanged { id: MessageId, value: Feedback },
}

/// Acknowledgement of a feedback submission.
#[derive(Debug)]
pub struct FeedbackReceipt {
    /// Whether a local turn carried the id.
    pub applied: bool,
    /// The spawned durable write, when one was started.
    pub durable: Option<JoinHandle<()>>,
}

/// Tunables taken from the `[retry]` config section.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub retry: RetryPolicy,
    pub fatal_markers: Vec<String>,
}

impl EngineOptions {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            fatal_markers: config.fatal_markers.clone(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Holds the engine for one send and sets the loading flag for its lifetime.
///
/// A send future dropped mid-flight leaves no in-progress state behind: the
/// open turn is closed and the state ends `Terminal`.
struct SendGuard<'a> {
    engine: &'a mut ChatEngine,
}

impl<'a> SendGuard<'a> {
    fn engage(engine: &'a mut ChatEngine) -> Self {
        engine.loading = true;
        Self { engine }
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        let engine = &mut *self.engine;
        if engine.state.is_loading() {
            warn!(session_id = %engine.session_id, state = %engine.state, "send abandoned");
            engine.transcript.close();
            engine.error = Some(ChatError::Cancelled.user_message());
            engine.set_state(SendState::Terminal);
        }
        engine.loading = false;
    }
}

/// Generates the per-engine runtime session id:
/// `session-<unix millis>-<32 hex chars>`.
pub fn new_runtime_session_id() -> String {
    format!(
        "session-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Drives one conversation against injected collaborators.
pub struct ChatEngine {
    session_id: SessionId,
    runtime_session_id: String,
    endpoint: Arc<dyn GenerationEndpoint>,
    credentials: Arc<dyn CredentialProvider>,
    sync: PersistenceSync,
    extractor: DeltaExtractor,
    policy: RetryPolicy,
    transcript: Transcript,
    state: SendState,
    loading: bool,
    error: Option<String>,
    /// Whether the session record is known to exist.
    session_ensured: bool,
    cancel: CancellationToken,
    subscribers: Vec<mpsc::UnboundedSender<EngineEvent>>,
}

impl ChatEngine {
    pub fn new(
        session_id: SessionId,
        endpoint: Arc<dyn GenerationEndpoint>,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn ConversationStore>,
        options: EngineOptions,
    ) -> Self {
        let runtime_session_id = new_runtime_session_id();
        debug!(session_id = %session_id, runtime_session_id = %runtime_session_id, "engine created");
        Self {
            session_id,
            runtime_session_id,
            endpoint,
            credentials,
            sync: PersistenceSync::new(store),
            extractor: DeltaExtractor::new(options.fatal_markers),
            policy: options.retry,
            transcript: Transcript::new(),
            state: SendState::Idle,
            loading: false,
            error: None,
            session_ensured: false,
            cancel: CancellationToken::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn runtime_session_id(&self) -> &str {
        &self.runtime_session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The user-visible error of the last failed send, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Token cancelling the current send. Cancelled while idle, it fails the
    /// next send before anything is appended. Replaced after each cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Opens a live event feed. Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn set_state(&mut self, state: SendState) {
        if self.state != state {
            debug!(session_id = %self.session_id, from = %self.state, to = %state, "send state");
            self.state = state;
            self.emit(EngineEvent::StateChanged(state));
        }
    }

    /// Sends one prompt, retrying transient failures, and returns once the
    /// response is complete or every attempt has failed.
    pub async fn send_message(&mut self, prompt: &str) -> SendOutcome {
        if prompt.trim().is_empty() {
            debug!("empty prompt skipped");
            return SendOutcome::Skipped;
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
            let message = ChatError::Cancelled.user_message();
            debug!(session_id = %self.session_id, "send cancelled before start");
            self.error = Some(message.clone());
            self.emit(EngineEvent::Error(message.clone()));
            self.set_state(SendState::Terminal);
            return SendOutcome::Failed(message);
        }

        let mut guard = SendGuard::engage(self);
        let outcome = guard.engine.drive(prompt).await;
        drop(guard);

        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        outcome
    }

    async fn drive(&mut self, prompt: &str) -> SendOutcome {
        self.error = None;

        let history = self.transcript.history();
        let index = self.transcript.append_pair(prompt);
        self.emit(EngineEvent::PairAppended {
            index,
            prompt: prompt.to_string(),
        });
        info!(session_id = %self.session_id, chars = prompt.chars().count(), "sending prompt");
        self.set_state(SendState::Sending);

        let placeholder = self.sync.create_placeholder(&self.session_id, prompt).await;
        if let Some(id) = &placeholder {
            self.transcript.attach_id(id.clone());
        }

        let request = ChatRequest {
            prompt: prompt.to_string(),
            history,
            runtime_session_id: self.runtime_session_id.clone(),
        };

        let result = self.run_with_retry(&request).await;
        let text = self.transcript.open_content().unwrap_or_default().to_string();
        self.transcript.close();

        match result {
            Ok(()) => {
                self.set_state(SendState::Completed);
                self.loading = false;
                info!(session_id = %self.session_id, chars = text.chars().count(), "response completed");

                self.sync.finalize(placeholder.as_ref(), &text).await;
                if !self.session_ensured {
                    self.session_ensured =
                        self.sync.ensure_session(&self.session_id, prompt).await;
                }
                SendOutcome::Completed
            }
            Err(err) => {
                let message = err.user_message();
                warn!(session_id = %self.session_id, error = %err, "send failed");
                self.error = Some(message.clone());
                self.emit(EngineEvent::Error(message.clone()));
                self.set_state(SendState::Terminal);
                SendOutcome::Failed(message)
            }
        }
    }

    async fn run_with_retry(&mut self, request: &ChatRequest) -> Result<(), ChatError> {
        let cancel = self.cancel.clone();
        let mut attempt: u32 = 0;
        loop {
            self.set_state(SendState::Sending);
            let err = match self.run_attempt(request, &cancel).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            self.set_state(SendState::Failed);

            if !self.policy.should_retry(attempt, &err) {
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                session_id = %self.session_id,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
            self.set_state(SendState::RetryScheduled);
            self.emit(EngineEvent::Retrying {
                attempt: attempt + 1,
                delay,
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            self.transcript.reset_open();
            attempt += 1;
        }
    }

    /// One request plus full stream consumption.
    async fn run_attempt(
        &mut self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        let credential = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            credential = self.credentials.credential() => credential?,
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            stream = self.endpoint.open_stream(request, &credential) => stream?,
        };
        self.set_state(SendState::Streaming);

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                item = stream.next() => item,
            };
            let Some(payload) = item else {
                return Ok(());
            };

            match self.extractor.extract(&payload?)? {
                Delta::Fragment(text) => {
                    self.transcript.apply_fragment(&text);
                    self.emit(EngineEvent::Fragment(text));
                }
                Delta::Status(value) => debug!(payload = %value, "status frame"),
                Delta::Ignore => {}
            }
        }
    }

    /// Replaces the transcript with the durable history of `session_id` and
    /// makes it the current session. A store failure yields an empty transcript.
    pub async fn load_history(&mut self, session_id: SessionId) -> usize {
        self.adopt_session(session_id);
        match self.sync.load_records(&self.session_id).await {
            Ok(records) => {
                self.transcript = Transcript::from_records(&records);
                debug!(session_id = %self.session_id, turns = self.transcript.len(), "history loaded");
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "history load failed");
            }
        }
        self.transcript.len()
    }

    /// Rates a turn locally and persists it on a spawned task. Never waits on the store.
    pub fn submit_feedback(&mut self, id: &MessageId, value: Feedback) -> FeedbackReceipt {
        if !self.transcript.set_feedback(id, value) {
            return FeedbackReceipt {
                applied: false,
                durable: None,
            };
        }
        self.emit(EngineEvent::FeedbackChanged {
            id: id.clone(),
            value,
        });

        let sync = self.sync.clone();
        let id = id.clone();
        let durable = tokio::spawn(async move {
            sync.update_feedback(&id, value).await;
        });
        FeedbackReceipt {
            applied: true,
            durable: Some(durable),
        }
    }

    /// Resets local state. The durable store is untouched.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.error = None;
        self.set_state(SendState::Idle);
    }

    /// Clears local state and continues under a new caller-supplied session id.
    pub fn switch_session(&mut self, session_id: SessionId) {
        self.adopt_session(session_id);
    }

    fn adopt_session(&mut self, session_id: SessionId) {
        self.clear();
        self.session_id = session_id;
        self.session_ensured = false;
    }

    /// Deletes a session durably. Deleting the current session also clears it locally.
    pub async fn delete_session(&mut self, session_id: &SessionId) -> Result<(), ChatError> {
        self.sync.delete_session(session_id).await?;
        if *session_id == self.session_id {
            self.clear();
            self.session_ensured = false;
        }
        Ok(())
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ChatError> {
        self.sync.list_sessions().await
    }
}
