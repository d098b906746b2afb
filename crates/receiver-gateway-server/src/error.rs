// ABOUTME: The gateway's client-facing error type and its JSON rendering.
// ABOUTME: Every failure path ends here as `{"error": "..."}` with a fixed status code.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use receiver_gateway_core::AuthError;
use receiver_gateway_upstream::{MalformedBody, UpstreamError};

/// Message returned to clients when the receiver API cannot be reached.
pub const UPSTREAM_UNREACHABLE_MESSAGE: &str = "Failed to reach SRTLA receiver backend";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidCredentials,
    Unauthorized,
    UpstreamUnreachable,
    BadRequest(String),
    NotFound,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::UpstreamUnreachable => UPSTREAM_UNREACHABLE_MESSAGE,
            ApiError::BadRequest(msg) => msg,
            ApiError::NotFound => "Not found",
            ApiError::Internal => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Unauthorized => ApiError::Unauthorized,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        if err.is_unreachable() {
            ApiError::UpstreamUnreachable
        } else {
            tracing::error!("upstream misconfigured: {}", err);
            ApiError::Internal
        }
    }
}

impl From<MalformedBody> for ApiError {
    fn from(err: MalformedBody) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
