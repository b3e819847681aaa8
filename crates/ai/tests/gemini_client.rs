use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use tinkerscout_ai::{GeminiClient, GeminiConfig, IntelligenceClient, UpstreamError};

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<(String, String, Value)>>>,
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn generate(
    State(fake): State<FakeGemini>,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    fake.seen.lock().unwrap().push((
        model,
        params.get("key").cloned().unwrap_or_default(),
        body,
    ));
    tokio::time::sleep(fake.delay).await;
    (fake.status, Json(fake.reply.clone()))
}

async fn spawn(fake: FakeGemini) -> TestServer {
    let app = Router::new()
        .route("/v1beta/models/:model", post(generate))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { base_url, handle }
}

fn fake(status: StatusCode, reply: Value) -> FakeGemini {
    FakeGemini {
        status,
        reply,
        delay: Duration::ZERO,
        seen: Arc::new(Mutex::new(Vec::new())),
    }
}

fn client_for(srv: &TestServer) -> GeminiClient {
    GeminiClient::new(
        GeminiConfig::new("secret-key")
            .with_base_url(srv.base_url.clone())
            .with_model("gemini-test")
            .with_timeout(Duration::from_millis(500)),
    )
    .unwrap()
}

#[tokio::test]
async fn returns_first_candidate_text_and_sends_payload() {
    let fake = fake(
        StatusCode::OK,
        json!({ "candidates": [{ "content": { "parts": [{ "text": "[{\"name\":\"FOO\"}]" }] } }] }),
    );
    let seen = fake.seen.clone();
    let srv = spawn(fake).await;

    let text = client_for(&srv).query("find tinkers").await.unwrap();
    assert_eq!(text, r#"[{"name":"FOO"}]"#);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (model, key, body) = &seen[0];
    assert_eq!(model, "gemini-test:generateContent");
    assert_eq!(key, "secret-key");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "find tinkers");
}

#[tokio::test]
async fn missing_candidate_text_reads_as_empty_batch() {
    let srv = spawn(fake(StatusCode::OK, json!({ "candidates": [] }))).await;
    assert_eq!(client_for(&srv).query("p").await.unwrap(), "[]");
}

#[tokio::test]
async fn non_success_status_is_upstream_error() {
    let srv = spawn(fake(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "quota exhausted" } }),
    ))
    .await;

    let err = client_for(&srv).query("p").await.unwrap_err();
    assert_eq!(err.status_code(), Some(429));
    match err {
        UpstreamError::Status { message, .. } => assert!(message.contains("quota exhausted")),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mut slow = fake(StatusCode::OK, json!({ "candidates": [] }));
    slow.delay = Duration::from_secs(3);
    let srv = spawn(slow).await;

    let err = client_for(&srv).query("p").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_upstream_is_transport_error() {
    let client = GeminiClient::new(
        GeminiConfig::new("k")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(500)),
    )
    .unwrap();

    let err = client.query("p").await.unwrap_err();
    assert!(
        matches!(err, UpstreamError::Transport(_) | UpstreamError::Timeout(_)),
        "got {err:?}"
    );
}
