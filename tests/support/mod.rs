//! Purpose: Loopback mock of a Databricks workspace for integration tests.
//! Exports: `MockWorkspace`, `RecordedRequest`, `TestResult`.
//! Role: Records every request and replays canned `(status, body)` responses per method + path.
//! Invariants: Binds `127.0.0.1:0`; the server thread stops when the mock is dropped.
//! Invariants: The last canned response for a route keeps replaying once the queue drains.
#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    /// Percent-encoded path as sent on the wire.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(query) = &self.query else {
            return Vec::new();
        };
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

#[derive(Clone)]
struct Canned {
    status: u16,
    body: String,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), VecDeque<Canned>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockWorkspace {
    base_url: String,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockWorkspace {
    pub fn start() -> TestResult<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let state = Arc::new(MockState::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let app = Router::new().fallback(handle).with_state(state.clone());
        let thread = std::thread::spawn(move || {
            runtime.block_on(async move {
                let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                    return;
                };
                let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                });
                let _ = server.await;
            });
        });

        Ok(Self {
            base_url,
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queues a JSON response for `method path` (path without query string).
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.respond_raw(method, path, status, &body.to_string())
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        let mut routes = self
            .state
            .routes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(Canned {
                status,
                body: body.to_string(),
            });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn only_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected one request, got {requests:?}");
        requests.into_iter().next().expect("one request")
    }
}

impl Drop for MockWorkspace {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body_json = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())),
        )
    };
    state
        .requests
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            query: uri.query().map(str::to_string),
            authorization: headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body: body_json,
        });

    let canned = {
        let mut routes = state
            .routes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        routes
            .get_mut(&(method.to_string(), path.clone()))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
    };

    match canned {
        Some(canned) => {
            let status =
                StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [("content-type", "application/json")],
                canned.body,
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            [("content-type", "application/json")],
            json!({
                "error_code": "ENDPOINT_NOT_FOUND",
                "message": format!("no mock route for {method} {path}"),
            })
            .to_string(),
        )
            .into_response(),
    }
}
