// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over the real collaborators: the HTTP endpoint against a
//! wiremock server, the access-token provider, and SQLite in a temp dir.
//!
//! Each test owns its server and database; tests are order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use streamchat_config::model::{AuthConfig, EndpointConfig, StorageConfig};
use streamchat_core::{ConversationStore, Feedback, SessionId};
use streamchat_engine::{ChatEngine, EngineOptions, RetryPolicy, SendOutcome};
use streamchat_sse::{HttpEndpoint, TokenCredentials};
use streamchat_storage::SqliteStore;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_HELLO: &str = "data: {\"init_event_loop\":true}\n\n\
data: {\"text\":\"Hi\"}\n\n\
data: {\"event\":{\"contentBlockDelta\":{\"delta\":{\"text\":\" there\"}}}}\n\n\
data: [DONE]\n\n";

struct Env {
    server: MockServer,
    _dir: TempDir,
    storage: StorageConfig,
}

impl Env {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            database_path: dir.path().join("chat.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        Self {
            server: MockServer::start().await,
            _dir: dir,
            storage,
        }
    }

    async fn engine(&self, session: &str) -> (ChatEngine, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open(&self.storage).await.unwrap());
        let endpoint = HttpEndpoint::new(&EndpointConfig {
            url: format!("{}/invocations", self.server.uri()),
            ..EndpointConfig::default()
        })
        .unwrap();
        let credentials = TokenCredentials::new(&AuthConfig {
            access_token: Some("e2e-token".into()),
        });
        let options = EngineOptions {
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(10),
            },
            ..EngineOptions::default()
        };
        let engine = ChatEngine::new(
            SessionId::from(session),
            Arc::new(endpoint),
            Arc::new(credentials),
            store.clone(),
            options,
        );
        (engine, store)
    }
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn send_persists_and_resumes() {
    let env = Env::start().await;
    Mock::given(method("POST"))
        .and(path("/invocations"))
        .and(header("authorization", "Bearer e2e-token"))
        .respond_with(sse(SSE_HELLO))
        .expect(1)
        .mount(&env.server)
        .await;

    let (mut engine, store) = env.engine("session-e2e").await;
    assert_eq!(engine.send_message("hello").await, SendOutcome::Completed);
    store.close().await.unwrap();
    drop(engine);

    let (mut resumed, store) = env.engine("other").await;
    let turns = resumed.load_history(SessionId::from("session-e2e")).await;
    assert_eq!(turns, 2);
    let contents: Vec<&str> = resumed
        .transcript()
        .turns()
        .iter()
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(contents, vec!["hello", "Hi there"]);

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "hello");
}

#[tokio::test]
async fn transient_status_is_retried_over_http() {
    let env = Env::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({ "error": "warming up" })),
        )
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(sse(SSE_HELLO))
        .mount(&env.server)
        .await;

    let (mut engine, store) = env.engine("session-retry").await;
    assert_eq!(engine.send_message("hello").await, SendOutcome::Completed);
    assert_eq!(engine.transcript().turns()[1].content, "Hi there");

    let records = store
        .list_messages_by_session(&SessionId::from("session-retry"))
        .await
        .unwrap();
    assert_eq!(records.len(), 1, "retries reuse the placeholder record");
    assert_eq!(records[0].ai_response.as_deref(), Some("Hi there"));
    assert_eq!(env.server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn fatal_stream_error_surfaces_without_retry() {
    let env = Env::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(
            "data: {\"error\":\"ValidationException: prompt too long\"}\n\n",
        ))
        .mount(&env.server)
        .await;

    let (mut engine, store) = env.engine("session-fatal").await;
    let outcome = engine.send_message("hello").await;

    assert_eq!(
        outcome,
        SendOutcome::Failed("Communication error: ValidationException: prompt too long".into())
    );
    assert_eq!(env.server.received_requests().await.unwrap().len(), 1);
    let records = store
        .list_messages_by_session(&SessionId::from("session-fatal"))
        .await
        .unwrap();
    assert_eq!(records[0].ai_response.as_deref(), Some(""));
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn feedback_and_delete_reach_sqlite() {
    let env = Env::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(SSE_HELLO))
        .mount(&env.server)
        .await;

    let (mut engine, store) = env.engine("session-fb").await;
    engine.send_message("hello").await;
    let id = engine.transcript().turns()[1].id.clone().unwrap();

    let receipt = engine.submit_feedback(&id, Feedback::Bad);
    assert!(receipt.applied);
    receipt.durable.unwrap().await.unwrap();

    let session = SessionId::from("session-fb");
    let records = store.list_messages_by_session(&session).await.unwrap();
    assert_eq!(records[0].feedback, Some(Feedback::Bad));

    engine.delete_session(&session).await.unwrap();
    assert!(store.list_messages_by_session(&session).await.unwrap().is_empty());
    assert!(store.list_sessions().await.unwrap().is_empty());
    assert!(engine.transcript().is_empty());
}
