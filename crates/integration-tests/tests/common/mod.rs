//! In-process fake of the Sunra HTTP/SSE surface

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const REQUEST_ID: &str = "req-1";

/// What the client sent
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    /// Endpoint ids as seen in submit and run paths
    pub endpoints: Vec<String>,
    pub authorization: Vec<Option<String>>,
    pub inputs: Vec<Value>,
    pub webhooks: Vec<Option<String>>,
    pub stream_accepts: Vec<Vec<String>>,
    pub proxy_targets: Vec<String>,
    pub cancels: usize,
    pub polls: usize,
}

/// Scripted server behavior
pub struct FakeApi {
    /// Status payloads sent over the stream, in order; the stream closes after the last
    pub events: Vec<Value>,
    /// Payload served by the result route
    pub result: Value,
    /// Answer submit with 429 and rate-limit headers
    pub rate_limited: bool,
    /// Status polls walk through `events` instead of repeating the first one
    pub advance_polls: bool,
    pub recorded: Mutex<Recorded>,
}

impl FakeApi {
    pub fn new(events: Vec<Value>) -> Self {
        Self {
            events,
            result: json!({"images": [{"url": "https://cdn.sunra.ai/out.png"}]}),
            rate_limited: false,
            advance_polls: false,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            rate_limited: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn polling(events: Vec<Value>) -> Self {
        Self {
            advance_polls: true,
            ..Self::new(events)
        }
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }
}

pub fn status(kind: &str) -> Value {
    json!({
        "status": kind,
        "request_id": REQUEST_ID,
        "status_url": format!("/v1/queue/requests/{}/status", REQUEST_ID),
        "response_url": format!("/v1/queue/requests/{}", REQUEST_ID),
        "cancel_url": format!("/v1/queue/requests/{}/cancel", REQUEST_ID),
    })
}

pub fn happy_events() -> Vec<Value> {
    let mut queued = status("IN_QUEUE");
    queued["queue_position"] = json!(0);
    let mut progress = status("IN_PROGRESS");
    progress["logs"] = json!("step 1/2");
    vec![queued, progress, status("COMPLETED")]
}

type Shared = Arc<FakeApi>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `owner/app[/path]` from the matched route
fn endpoint_id(params: &HashMap<String, String>) -> String {
    let mut id = format!("{}/{}", params["owner"], params["app"]);
    if let Some(path) = params.get("path") {
        id.push('/');
        id.push_str(path);
    }
    id
}

async fn submit(
    State(api): State<Shared>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    {
        let mut recorded = api.recorded.lock().unwrap();
        recorded.endpoints.push(endpoint_id(&params));
        recorded.authorization.push(header(&headers, "authorization"));
        recorded.inputs.push(input);
        recorded.webhooks.push(query.get("webhook").cloned());
    }

    if api.rate_limited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("x-request-id", "req-limited"),
                ("x-ratelimit-limit", "10"),
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", "1234567890"),
            ],
            Json(json!({"error": {"message": "rate limited", "code": "RATE_LIMITED"}})),
        )
            .into_response();
    }

    let mut body = status("IN_QUEUE");
    body["queue_position"] = json!(3);
    ([("x-request-id", REQUEST_ID)], Json(body)).into_response()
}

async fn poll_status(State(api): State<Shared>, Path(id): Path<String>) -> Response {
    if id != REQUEST_ID {
        return not_found();
    }
    let polls = {
        let mut recorded = api.recorded.lock().unwrap();
        recorded.polls += 1;
        recorded.polls
    };
    let index = if api.advance_polls { polls - 1 } else { 0 };
    let latest = api
        .events
        .get(index.min(api.events.len().saturating_sub(1)))
        .cloned()
        .unwrap_or_else(|| status("IN_QUEUE"));
    Json(latest).into_response()
}

async fn stream_status(
    State(api): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let accepts = headers
        .get_all("accept")
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    api.recorded.lock().unwrap().stream_accepts.push(accepts);

    if id != REQUEST_ID {
        return not_found();
    }

    let mut events = vec![Event::default().comment("keep-alive")];
    for payload in &api.events {
        events.push(Event::default().data(payload.to_string()));
    }
    let stream = futures::stream::iter(events.into_iter().map(Ok::<_, Infallible>));
    Sse::new(stream).into_response()
}

async fn fetch_result(State(api): State<Shared>, Path(id): Path<String>) -> Response {
    if id != REQUEST_ID {
        return not_found();
    }
    ([("x-request-id", REQUEST_ID)], Json(api.result.clone())).into_response()
}

async fn cancel(State(api): State<Shared>, Path(_id): Path<String>) -> Json<Value> {
    api.recorded.lock().unwrap().cancels += 1;
    Json(json!({"status": "CANCELLATION_REQUESTED"}))
}

async fn run(
    State(api): State<Shared>,
    Path(params): Path<HashMap<String, String>>,
    Json(input): Json<Value>,
) -> Response {
    let endpoint = endpoint_id(&params);
    api.recorded.lock().unwrap().endpoints.push(endpoint.clone());
    (
        [("x-request-id", "run-1")],
        Json(json!({"endpoint": endpoint, "echo": input})),
    )
        .into_response()
}

async fn proxy(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let target = header(&headers, "x-sunra-target-url").unwrap_or_default();
    api.recorded.lock().unwrap().proxy_targets.push(target);
    ([("x-request-id", "proxied-1")], Json(json!({"proxied": true}))).into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {"message": "Request not found", "code": "NOT_FOUND", "type": "not_found"},
            "timestamp": "2025-01-01T00:00:00Z"
        })),
    )
        .into_response()
}

pub fn router(api: Shared) -> Router {
    Router::new()
        .route("/v1/queue/{owner}/{app}", post(submit))
        .route("/v1/queue/{owner}/{app}/{*path}", post(submit))
        .route("/v1/queue/requests/{id}", get(fetch_result))
        .route("/v1/queue/requests/{id}/status", get(poll_status))
        .route("/v1/queue/requests/{id}/status/stream", get(stream_status))
        .route("/v1/queue/requests/{id}/cancel", put(cancel))
        .route("/v1/{owner}/{app}", post(run))
        .route("/v1/{owner}/{app}/{*path}", post(run))
        .route("/proxy", post(proxy))
        .with_state(api)
}

/// Serve the fake API on an ephemeral port; returns the `/v1` base URL
pub async fn spawn_server(api: Shared) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(api);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}/v1", addr))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
