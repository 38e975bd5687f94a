//! Drives `BackendClient` and the flow states against an in-process mock
//! backend.
//!
//! Run with: cargo test -p digest-proto --test backend_client

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use digest_proto::client::{BackendClient, ClientError, MessageLimit};
use digest_proto::query::QueryDesk;
use digest_proto::schedule;
use digest_proto::scrape::{ScrapeTrigger, SCRAPE_CONFIRMATION};
use digest_proto::session::{LoginOutcome, SessionGate, REJECTED_ALERT};
use digest_proto::summaries::{SummaryFeed, SummaryView};

const PASSWORD: &str = "open-sesame";

#[derive(Clone, Default)]
struct MockBackend {
    root_hits: Arc<AtomicUsize>,
    summary_queries: Arc<Mutex<Vec<Option<String>>>>,
    scrape_calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

async fn root(State(mock): State<MockBackend>) -> &'static str {
    mock.root_hits.fetch_add(1, Ordering::SeqCst);
    "ok"
}

async fn login(Json(body): Json<Value>) -> Json<Value> {
    let ok = body["password"].as_str() == Some(PASSWORD);
    Json(json!({ "authenticated": ok }))
}

async fn ask(Json(body): Json<Value>) -> Response {
    match body["query"].as_str().unwrap_or_default() {
        "explode" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "model unavailable" })),
        )
            .into_response(),
        "teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
        "garbled" => "this is not json".into_response(),
        "empty index" => Json(json!({ "error": "no messages indexed yet" })).into_response(),
        query => Json(json!({
            "answer": "42 users",
            "chat_history": [
                { "role": "user", "content": query },
                { "role": "assistant", "content": null, "tool_calls": [
                    { "id": "call_0", "type": "function", "function": {
                        "name": "route_query",
                        "arguments": "{\"approach\":\"sql\",\"sql_query\":\"SELECT COUNT(DISTINCT author_id) FROM messages\"}"
                    } }
                ] },
                { "role": "assistant", "content": "42 users" }
            ]
        }))
        .into_response(),
    }
}

async fn summaries(
    State(mock): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    mock.summary_queries
        .lock()
        .unwrap()
        .push(params.get("force_refresh").cloned());
    Json(json!({ "summaries": [
        { "channel_id": 1, "channel_name": "general", "message_count": 50,
          "unique_authors": 5, "most_active_hour": "14:00", "summary": "...",
          "cache_age_seconds": 3600 },
        { "channel_id": 2, "channel_name": "dots-admin", "message_count": 999,
          "unique_authors": 2, "most_active_hour": "09:00", "summary": "internal",
          "cache_age_seconds": 60 },
        { "channel_id": 3, "channel_name": "hardware", "message_count": 75,
          "unique_authors": 11, "most_active_hour": "18:00", "summary": "**busy**",
          "cache_age_seconds": 0 }
    ] }))
}

async fn scrape(
    State(mock): State<MockBackend>,
    Path(guild_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.scrape_calls
        .lock()
        .unwrap()
        .push((guild_id.clone(), params.get("limit").cloned()));
    match guild_id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Guild not found" })),
        )
            .into_response(),
        "silent" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "chatty" => Json(json!({ "status": "queued", "messages": 100 })).into_response(),
        _ => StatusCode::OK.into_response(),
    }
}

async fn failing_summaries() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start_mock() -> (BackendClient, MockBackend) {
    let mock = MockBackend::default();
    let router = Router::new()
        .route("/", get(root))
        .route("/login", post(login))
        .route("/ask", post(ask))
        .route("/channel-summaries", get(summaries))
        .route("/discord/:guild_id", post(scrape))
        .with_state(mock.clone());
    let base = spawn_backend(router).await;
    let client = BackendClient::new(&format!("{}/", base), Duration::from_secs(5)).unwrap();
    (client, mock)
}

fn excluded() -> Vec<String> {
    vec!["dots-admin".to_string(), "customer-whitelabel".to_string()]
}

// ── Session gate ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_accepted() {
    let (client, _) = start_mock().await;
    let mut gate = SessionGate::new();
    gate.input_password = PASSWORD.to_string();

    let (ticket, password) = gate.begin_login().unwrap();
    let outcome = gate.settle_login(ticket, client.login(&password).await);
    assert_eq!(outcome, LoginOutcome::Authenticated);
    assert!(gate.is_authenticated());
}

#[tokio::test]
async fn test_login_rejected() {
    let (client, _) = start_mock().await;
    let mut gate = SessionGate::new();
    gate.input_password = "wrong".to_string();

    let (ticket, password) = gate.begin_login().unwrap();
    let outcome = gate.settle_login(ticket, client.login(&password).await);
    assert_eq!(outcome, LoginOutcome::Alert(REJECTED_ALERT.to_string()));
    assert!(!gate.is_authenticated());
}

#[tokio::test]
async fn test_login_unreachable_backend_is_an_error() {
    let client = BackendClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.login("anything").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_unconfigured_base_url_fails_every_request() {
    let client = BackendClient::new("", Duration::from_secs(2)).unwrap();
    assert!(client.ping().await.is_err());
    assert!(client.channel_summaries(false).await.is_err());
}

// ── Query ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ask_returns_answer_and_trace() {
    let (client, _) = start_mock().await;
    let mut desk = QueryDesk::new();
    desk.input = "how many users?".to_string();

    let (ticket, query) = desk.begin_submit();
    desk.settle(ticket, client.ask(&query).await);

    assert!(!desk.is_loading());
    assert_eq!(desk.error(), None);
    let result = desk.result().unwrap();
    assert_eq!(result.answer, "42 users");
    assert_eq!(result.chat_history.len(), 3);
    assert_eq!(result.chat_history[0].content_text(), "how many users?");
    assert_eq!(
        result.generated_sql().as_deref(),
        Some("SELECT COUNT(DISTINCT author_id) FROM messages")
    );
}

#[tokio::test]
async fn test_ask_error_field_is_a_failure() {
    let (client, _) = start_mock().await;
    let mut desk = QueryDesk::new();
    desk.input = "empty index".to_string();

    let (ticket, query) = desk.begin_submit();
    desk.settle(ticket, client.ask(&query).await);
    assert!(desk.result().is_none());
    assert_eq!(desk.error(), Some("no messages indexed yet"));
}

#[tokio::test]
async fn test_ask_error_field_wins_over_status() {
    let (client, _) = start_mock().await;
    match client.ask("explode").await {
        Err(ClientError::Backend(msg)) => assert_eq!(msg, "model unavailable"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_ask_non_json_failure_reports_status() {
    let (client, _) = start_mock().await;
    let err = client.ask("teapot").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::IM_A_TEAPOT));
}

#[tokio::test]
async fn test_ask_garbled_body_is_decode_error() {
    let (client, _) = start_mock().await;
    let err = client.ask("garbled").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_ask_empty_query_is_sent() {
    let (client, _) = start_mock().await;
    let result = client.ask("").await.unwrap();
    assert_eq!(result.chat_history[0].content_text(), "");
}

// ── Summaries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_summaries_filtered_and_sorted() {
    let (client, mock) = start_mock().await;
    let mut feed = SummaryFeed::new();

    let ticket = feed.begin_fetch(false);
    assert!(feed.settle(ticket, client.channel_summaries(false).await));

    match feed.view(&excluded()) {
        SummaryView::Channels(list) => {
            let names: Vec<&str> = list.iter().map(|c| c.channel_name.as_str()).collect();
            assert_eq!(names, vec!["hardware", "general"]);
        }
        other => panic!("unexpected view: {:?}", other),
    }
    assert_eq!(mock.summary_queries.lock().unwrap().as_slice(), &[None]);
}

#[tokio::test]
async fn test_force_refresh_sets_query_parameter() {
    let (client, mock) = start_mock().await;
    client.channel_summaries(true).await.unwrap();
    assert_eq!(
        mock.summary_queries.lock().unwrap().as_slice(),
        &[Some("true".to_string())]
    );
}

#[tokio::test]
async fn test_summaries_failure_sets_error() {
    let router = Router::new().route("/channel-summaries", get(failing_summaries));
    let base = spawn_backend(router).await;
    let client = BackendClient::new(&base, Duration::from_secs(5)).unwrap();

    let mut feed = SummaryFeed::new();
    let ticket = feed.begin_fetch(false);
    feed.settle(ticket, client.channel_summaries(false).await);
    assert_eq!(
        feed.view(&excluded()),
        SummaryView::Failed("Failed to fetch channel summaries")
    );
    assert!(!feed.is_loading());
}

// ── Scrape ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scrape_success_with_empty_body() {
    let (client, mock) = start_mock().await;
    let mut trigger = ScrapeTrigger::new(100);
    trigger.guild_id = "123456".to_string();

    let (ticket, req) = trigger.begin_scrape();
    let outcome = client.scrape(&req.guild_id, req.limit).await;
    assert_eq!(trigger.settle(ticket, outcome), Some(SCRAPE_CONFIRMATION));
    assert_eq!(
        mock.scrape_calls.lock().unwrap().as_slice(),
        &[("123456".to_string(), Some("100".to_string()))]
    );
}

#[tokio::test]
async fn test_scrape_success_keeps_json_body() {
    let (client, _) = start_mock().await;
    let receipt = client.scrape("chatty", MessageLimit::parse("100")).await.unwrap();
    assert_eq!(receipt.body.unwrap()["status"], "queued");
}

#[tokio::test]
async fn test_scrape_nan_limit_forwarded() {
    let (client, mock) = start_mock().await;
    client.scrape("777", MessageLimit::parse("")).await.unwrap();
    assert_eq!(
        mock.scrape_calls.lock().unwrap()[0].1.as_deref(),
        Some("NaN")
    );
}

#[tokio::test]
async fn test_scrape_failure_messages() {
    let (client, _) = start_mock().await;
    let err = client.scrape("missing", MessageLimit::parse("10")).await.unwrap_err();
    assert_eq!(err.to_string(), "Guild not found");

    let err = client.scrape("silent", MessageLimit::parse("10")).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to scrape server");
}

// ── Keep-warm ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_keep_warm_pings_until_shutdown() {
    let (client, mock) = start_mock().await;
    let pinger = schedule::keep_warm(client, Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(mock.root_hits.load(Ordering::SeqCst) >= 2);

    pinger.shutdown().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = mock.root_hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(mock.root_hits.load(Ordering::SeqCst), settled);
}

async fn stalled_root(State(mock): State<MockBackend>) -> &'static str {
    mock.root_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    "ok"
}

#[tokio::test]
async fn test_keep_warm_keeps_schedule_with_stalled_backend() {
    let mock = MockBackend::default();
    let router = Router::new()
        .route("/", get(stalled_root))
        .with_state(mock.clone());
    let base = spawn_backend(router).await;
    let client = BackendClient::new(&base, Duration::from_secs(30)).unwrap();
    let pinger = schedule::keep_warm(client, Duration::from_millis(200));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(mock.root_hits.load(Ordering::SeqCst) >= 5);

    pinger.shutdown().await;
}
