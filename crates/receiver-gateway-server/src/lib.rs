// ABOUTME: HTTP server for receiver-gateway: login, bearer-token guard, and the receiver API proxy.
// ABOUTME: Uses Axum with shared state holding the credential issuer, session store, and upstream client.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

pub use app_state::{AppState, SharedState, spawn_session_sweeper};
pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use routes::{RECEIVER_PREFIX, create_router};
