//! In-process stand-in for the detection service, used by tests.
//!
//! Records every request it receives and answers with canned JSON per path.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Shared {
    requests: Vec<RecordedRequest>,
    responses: HashMap<String, (u16, String)>,
}

pub struct TestServer {
    addr: SocketAddr,
    shared: Arc<Mutex<Shared>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind to a random local port and start serving.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shared = Arc::new(Mutex::new(Shared::default()));
        let router = Router::new().fallback(record).with_state(shared.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            addr,
            shared,
            handle,
        }
    }

    /// Base URL in the same shape as the real service's (`.../api`).
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Answer `path` (relative to `/api`) with `body` and `status`.
    pub fn respond(self, path: &str, status: u16, body: Value) -> Self {
        self.respond_raw(path, status, &body.to_string())
    }

    pub fn respond_raw(self, path: &str, status: u16, body: &str) -> Self {
        self.shared
            .lock()
            .unwrap()
            .responses
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.lock().unwrap().requests.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(shared): State<Arc<Mutex<Shared>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let mut shared = shared.lock().unwrap();
    shared.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        content_type,
        body,
    });

    let key = path.strip_prefix("/api").unwrap_or(&path);
    match shared.responses.get(key) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
