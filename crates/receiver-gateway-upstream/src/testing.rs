// ABOUTME: Test utilities: a stub receiver API that records every request it gets.
// ABOUTME: Used by this crate and the server crate to assert what the gateway sends upstream.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Response, StatusCode, Uri, header};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// The canned answer a stub upstream gives to every request.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl StubResponse {
    /// A JSON response with the given status and body text.
    pub fn json(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    /// A response with an arbitrary content type and raw bytes.
    pub fn raw(status: StatusCode, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(HeaderValue::from_static(content_type)),
            body: body.into(),
            delay: None,
        }
    }

    /// Wait this long before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

struct StubState {
    response: StubResponse,
    recorded: Mutex<Vec<RecordedRequest>>,
}

/// A real HTTP server on 127.0.0.1 with an ephemeral port. The server task
/// is aborted when the stub is dropped.
pub struct StubUpstream {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubUpstream {
    pub async fn spawn(response: StubResponse) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(StubState {
            response,
            recorded: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(record_and_answer)
            .with_state(Arc::clone(&state));
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("stub upstream stopped: {}", e);
            }
        });

        Ok(Self { addr, state, task })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn call_count(&self) -> usize {
        self.state.recorded.lock().await.len()
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorded.lock().await.clone()
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record_and_answer(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response<Body> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    state.recorded.lock().await.push(RecordedRequest {
        method,
        path_and_query,
        headers,
        body: body.to_vec(),
    });

    let canned = &state.response;
    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::new(Body::from(canned.body.clone()));
    *response.status_mut() = canned.status;
    if let Some(ref content_type) = canned.content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    response
}

/// A base URL nothing is listening on: bind an ephemeral port, then release it.
pub async fn unreachable_base_url() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
