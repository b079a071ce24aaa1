//! Mock Fireworks backend for integration tests
//!
//! Serves `/inference/v1/completions` and `/inference/v1/chat/completions`
//! with canned bodies or SSE streams and records every request it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TEXT: &str = "Hello from mock Fireworks";

/// Request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn has_prompt(&self) -> bool {
        self.body.get("prompt").is_some()
    }

    pub fn has_messages(&self) -> bool {
        self.body.get("messages").is_some()
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Status(StatusCode),
    /// One good chunk, then an unparseable one
    BrokenStream(String),
}

#[derive(Clone, Copy)]
enum Endpoint {
    Completions,
    ChatCompletions,
}

impl Endpoint {
    const fn path(self) -> &'static str {
        match self {
            Self::Completions => "/inference/v1/completions",
            Self::ChatCompletions => "/inference/v1/chat/completions",
        }
    }
}

struct MockState {
    reply: Reply,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Fireworks server bound to a random local port
pub struct MockFireworks {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockFireworks {
    /// Start a mock that answers with [`DEFAULT_TEXT`]
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(Reply::Text(DEFAULT_TEXT.to_owned())).await
    }

    /// Start a mock that answers with `text`
    pub async fn start_with_text(text: &str) -> anyhow::Result<Self> {
        Self::start_inner(Reply::Text(text.to_owned())).await
    }

    /// Start a mock that rejects every request with `status`
    pub async fn start_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_inner(Reply::Status(status)).await
    }

    /// Start a mock whose streams break after the first chunk
    pub async fn start_with_broken_stream(first_chunk: &str) -> anyhow::Result<Self> {
        Self::start_inner(Reply::BrokenStream(first_chunk.to_owned())).await
    }

    async fn start_inner(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(Endpoint::Completions.path(), routing::post(handle_completions))
            .route(Endpoint::ChatCompletions.path(), routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure the adapter with
    pub fn base_url(&self) -> String {
        format!("http://{}/inference/v1", self.addr)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The single request received; panics otherwise
    pub fn only_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request, got {requests:?}");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockFireworks {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Endpoint::Completions, &headers, body)
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Endpoint::ChatCompletions, &headers, body)
}

fn respond(state: &MockState, endpoint: Endpoint, headers: &HeaderMap, body: Value) -> Response {
    let stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    state.requests.lock().unwrap().push(RecordedRequest {
        path: endpoint.path().to_owned(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body,
    });

    match (&state.reply, stream) {
        (Reply::Status(status), _) => (
            *status,
            Json(json!({"error": {"message": "mock server intentional failure"}})),
        )
            .into_response(),
        (Reply::Text(text), false) => Json(json!({
            "id": "cmpl-mock",
            "choices": [full_choice(endpoint, text)]
        }))
        .into_response(),
        (Reply::Text(text), true) => {
            let mut chunks: Vec<_> = text
                .split_inclusive(' ')
                .map(|piece| chunk(endpoint, piece, None))
                .collect();
            chunks.push(chunk(endpoint, "", Some("stop")));
            // Usage trailer without choices
            chunks.push(json!({"id": "cmpl-mock", "choices": [], "usage": {"total_tokens": 15}}).to_string());
            sse(&chunks, true)
        }
        (Reply::BrokenStream(first), true) => sse(&[chunk(endpoint, first, None), "{not json".to_owned()], false),
        (Reply::BrokenStream(text), false) => Json(json!({
            "id": "cmpl-mock",
            "choices": [full_choice(endpoint, text)]
        }))
        .into_response(),
    }
}

fn full_choice(endpoint: Endpoint, text: &str) -> Value {
    match endpoint {
        Endpoint::Completions => json!({"index": 0, "text": text, "finish_reason": "stop"}),
        Endpoint::ChatCompletions => json!({
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }),
    }
}

fn chunk(endpoint: Endpoint, text: &str, finish_reason: Option<&str>) -> String {
    let choice = match endpoint {
        Endpoint::Completions => json!({"index": 0, "text": text, "finish_reason": finish_reason}),
        Endpoint::ChatCompletions => json!({"index": 0, "delta": {"content": text}, "finish_reason": finish_reason}),
    };
    json!({"id": "cmpl-mock", "choices": [choice]}).to_string()
}

fn sse(chunks: &[String], done: bool) -> Response {
    let mut body: String = chunks.iter().map(|chunk| format!("data: {chunk}\n\n")).collect();
    if done {
        body.push_str("data: [DONE]\n\n");
    }

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
