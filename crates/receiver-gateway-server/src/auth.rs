// ABOUTME: Bearer token authentication middleware guarding the receiver proxy prefix.
// ABOUTME: Validates Authorization against the session store and rejects with 401 before any forwarding.

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, header};
use axum::response::IntoResponse;
use receiver_gateway_core::SessionStore;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::ApiError;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// A tower Layer that requires a live session on every path under `prefix`.
#[derive(Clone)]
pub struct AuthLayer {
    sessions: Arc<dyn SessionStore>,
    prefix: Arc<str>,
}

impl AuthLayer {
    /// Create a new AuthLayer protecting `prefix` and everything below it.
    pub fn new(sessions: Arc<dyn SessionStore>, prefix: &str) -> Self {
        Self {
            sessions,
            prefix: Arc::from(prefix.trim_end_matches('/')),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            sessions: Arc::clone(&self.sessions),
            prefix: Arc::clone(&self.prefix),
        }
    }
}

/// The middleware service that checks bearer tokens on protected routes.
/// On success the validated `Session` is inserted into request extensions.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    sessions: Arc<dyn SessionStore>,
    prefix: Arc<str>,
}

impl<S> AuthMiddleware<S> {
    fn protects(&self, path: &str) -> bool {
        path == &*self.prefix
            || path
                .strip_prefix(&*self.prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        if !self.protects(req.uri().path()) {
            let mut inner = self.inner.clone();
            return Box::pin(async move { inner.call(req).await });
        }

        let token = bearer_token(req.headers()).map(str::to_owned);
        let sessions = Arc::clone(&self.sessions);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let session = match token {
                Some(ref token) => sessions.validate(token).await,
                None => None,
            };

            match session {
                Some(session) => {
                    tracing::debug!(
                        session_id = %session.id,
                        username = %session.username,
                        path = %req.uri().path(),
                        "request authorized"
                    );
                    req.extensions_mut().insert(session);
                    inner.call(req).await
                }
                None => {
                    tracing::warn!(
                        method = %req.method(),
                        path = %req.uri().path(),
                        token_present = token.is_some(),
                        "rejected unauthenticated request"
                    );
                    Ok(ApiError::Unauthorized.into_response())
                }
            }
        })
    }
}
