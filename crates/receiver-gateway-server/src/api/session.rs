// ABOUTME: Login and logout handlers: exchange credentials for a bearer token and revoke it again.
// ABOUTME: Login failures never reveal whether the username or the password was wrong.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use receiver_gateway_core::Role;
use serde::{Deserialize, Serialize};

use crate::app_state::SharedState;
use crate::auth::bearer_token;
use crate::error::ApiError;

/// Request body for `POST /api/login`. Missing fields are treated as empty
/// strings so they fail as invalid credentials rather than as bad input.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
}

/// Response body after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// POST /api/login - Authenticate and issue a session token.
pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let issued = state
        .issuer
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token.into_string(),
        expires_at: issued.session.expires_at,
        user: UserInfo {
            username: issued.session.username,
            role: issued.session.role,
        },
    }))
}

/// POST /api/logout - Revoke the presented bearer token.
pub async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    if state.sessions.revoke(token).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Unauthorized)
    }
}
