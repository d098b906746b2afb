// ABOUTME: Route definitions for the gateway HTTP API.
// ABOUTME: Assembles login, liveness, and the authenticated receiver proxy into one Axum Router.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::auth::AuthLayer;
use crate::error::ApiError;

/// Every path at or below this prefix is proxied and requires a session.
pub const RECEIVER_PREFIX: &str = "/api/receiver";

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/login", post(api::session::login))
        .route("/api/logout", post(api::session::logout))
        .route(RECEIVER_PREFIX, any(api::receiver::forward))
        .route("/api/receiver/", any(api::receiver::forward))
        .route("/api/receiver/{*rest}", any(api::receiver::forward))
        .fallback(not_found)
        .layer(AuthLayer::new(Arc::clone(&state.sessions), RECEIVER_PREFIX))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Liveness string for load balancers and humans.
async fn index() -> &'static str {
    "Dashboard API running!"
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail = %detail, "handler panicked");
    ApiError::Internal.into_response()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use axum::http::Request;
    use receiver_gateway_core::{Account, InMemorySessionStore, Role, StaticAccountStore};
    use receiver_gateway_upstream::{HeaderPolicy, UpstreamClient};
    use std::time::Duration;
    use tower::ServiceExt;

    pub(crate) fn test_state(upstream: &str) -> SharedState {
        let accounts = Arc::new(StaticAccountStore::new(vec![
            Account::new("admin", "adminpass", Role::Admin),
            Account::new("viewer", "viewerpass", Role::User),
        ]));
        let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
        let upstream =
            UpstreamClient::new(upstream, Duration::from_secs(5), HeaderPolicy::none()).unwrap();
        Arc::new(AppState::new(accounts, sessions, upstream))
    }

    pub(crate) async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Log in as admin directly through the issuer and return the token.
    pub(crate) async fn login_token(state: &SharedState) -> String {
        state
            .issuer
            .authenticate("admin", "adminpass")
            .await
            .unwrap()
            .token
            .into_string()
    }

    #[tokio::test]
    async fn index_returns_liveness_string() {
        let app = create_router(test_state("http://127.0.0.1:9"));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Dashboard API running!");
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(test_state("http://127.0.0.1:9"));
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = create_router(test_state("http://127.0.0.1:9"));
        let resp = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 404);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "error": "Not found" })
        );
    }

    #[tokio::test]
    async fn login_route_rejects_get() {
        let app = create_router(test_state("http://127.0.0.1:9"));
        let resp = app
            .oneshot(Request::get("/api/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 405);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_without_auth() {
        let app = create_router(test_state("http://127.0.0.1:9"));
        let resp = app
            .oneshot(
                Request::options("/api/receiver/streams")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .header("access-control-request-headers", "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }
}
