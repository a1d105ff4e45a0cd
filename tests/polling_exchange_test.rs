//! Polling assistant integration tests
//!
//! Drives `AssistantSession` with a `PollingExchange` end to end. The
//! in-memory store plays the external writer under paused time; the last
//! test polls the REST interface through wiremock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketa::assistant::{
    AssistantSession, PollingExchange, TurnEvent, TurnOutcome, TurnState, TIMEOUT_MESSAGE,
};
use marketa::store::{MemoryStore, RecordStore, RestStore};

use common::{backend_config, conversation_row};

fn polling_session(store: Arc<MemoryStore>, max_attempts: u32) -> AssistantSession {
    let exchange = Arc::new(PollingExchange::new(
        store.clone(),
        Duration::from_secs(1),
        max_attempts,
    ));
    AssistantSession::new(store, exchange, "user-1")
}

/// A prompt answered by the external writer shows up as the reply and the
/// session accepts input again.
#[tokio::test(start_paused = true)]
async fn test_prompt_answered_by_external_writer() {
    let store = Arc::new(MemoryStore::new());
    let mut session = polling_session(store.clone(), 60);

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            store
                .set_response(1, "Focus on segmentation.")
                .expect("record 1 should be awaiting a response");
        })
    };

    let started = tokio::time::Instant::now();
    let outcome = session.send("How do I improve email marketing?").await;
    writer.await.expect("writer task");

    assert_eq!(
        outcome,
        TurnOutcome::Completed {
            record_id: Some(1),
            reply: "Focus on segmentation.".to_string()
        }
    );
    assert!(started.elapsed() >= Duration::from_millis(3500));
    assert!(started.elapsed() < Duration::from_secs(4));

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user);
    assert_eq!(messages[0].content, "How do I improve email marketing?");
    assert!(!messages[1].is_user);
    assert_eq!(messages[1].content, "Focus on segmentation.");
    assert!(session.state().accepts_input());

    let stored = store.conversations();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id.as_deref(), Some("user-1"));
}

/// Dropping a turn midway leaves the session able to take the next prompt.
#[tokio::test(start_paused = true)]
async fn test_next_prompt_after_abandoned_turn() {
    let store = Arc::new(MemoryStore::new());
    let mut session = polling_session(store.clone(), 60);

    let abandoned = tokio::time::timeout(Duration::from_secs(2), session.send("first")).await;
    assert!(abandoned.is_err());

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            store
                .set_response(2, "Answer to second")
                .expect("record 2 should be awaiting a response");
        })
    };

    let outcome = session.send("second").await;
    writer.await.expect("writer task");

    assert_eq!(
        outcome,
        TurnOutcome::Completed {
            record_id: Some(2),
            reply: "Answer to second".to_string()
        }
    );
    assert!(session.state().accepts_input());

    let contents: Vec<_> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first", "second", "Answer to second"]);
}

/// With no writer the turn ends after the attempt budget with exactly one
/// timeout message.
#[tokio::test(start_paused = true)]
async fn test_unanswered_prompt_times_out_once() {
    let store = Arc::new(MemoryStore::new());
    let mut session = polling_session(store.clone(), 5);

    let started = tokio::time::Instant::now();
    let outcome = session.send("Anyone there?").await;

    assert_eq!(outcome, TurnOutcome::TimedOut);
    assert_eq!(started.elapsed(), Duration::from_secs(5));

    let messages = session.transcript().messages();
    let timeouts: Vec<_> = messages
        .iter()
        .filter(|m| m.content.contains(TIMEOUT_MESSAGE))
        .collect();
    assert_eq!(timeouts.len(), 1);
    assert!(timeouts[0].is_error());
    // Prompt plus the single error; the empty placeholder is gone.
    assert_eq!(messages.len(), 2);
    assert_eq!(session.state(), TurnState::Idle);

    // The prompt row stays behind without a response.
    assert_eq!(store.conversations().len(), 1);
    assert!(!store.conversations()[0].has_response());
}

/// A rejected insert fails the turn before any waiting happens.
#[tokio::test(start_paused = true)]
async fn test_insert_failure_fails_turn_immediately() {
    let store = Arc::new(MemoryStore::new());
    store.fail_inserts(true);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = polling_session(store.clone(), 60).with_events(tx);

    let started = tokio::time::Instant::now();
    let outcome = session.send("hello").await;

    assert!(matches!(outcome, TurnOutcome::Failed(_)));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(session.state().accepts_input());

    let mut saw_notice = false;
    let mut saw_awaiting = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            TurnEvent::Notice(notice) => {
                assert!(notice.is_destructive());
                saw_notice = true;
            }
            TurnEvent::StateChanged(TurnState::AwaitingResponse) => saw_awaiting = true,
            _ => {}
        }
    }
    assert!(saw_notice);
    assert!(!saw_awaiting);
}

/// Polling over REST keeps re-reading until the response column is set.
#[tokio::test]
async fn test_polls_rest_store_until_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/Conversations"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([conversation_row(11, "hi", None)])),
        )
        .mount(&server)
        .await;

    // First two reads see no response yet.
    Mock::given(method("GET"))
        .and(path("/rest/v1/Conversations"))
        .and(query_param("id", "eq.11"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([conversation_row(11, "hi", None)])),
        )
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/Conversations"))
        .and(query_param("id", "eq.11"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([conversation_row(11, "hi", Some("hello"))])),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let store: Arc<dyn RecordStore> =
        Arc::new(RestStore::new(&backend_config(&server.uri())).expect("store"));
    let exchange = Arc::new(PollingExchange::new(
        store.clone(),
        Duration::from_millis(10),
        20,
    ));
    let mut session = AssistantSession::new(store, exchange, "user-1");

    let outcome = session.send("hi").await;
    assert_eq!(
        outcome,
        TurnOutcome::Completed {
            record_id: Some(11),
            reply: "hello".to_string()
        }
    );

    let reads = server
        .received_requests()
        .await
        .expect("request recording")
        .into_iter()
        .filter(|r| r.method.to_string() == "GET")
        .count();
    assert_eq!(reads, 3);
}
