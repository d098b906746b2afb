// ABOUTME: Transparent proxy handler for everything under /api/receiver.
// ABOUTME: Forwards method, path suffix, query, and JSON body upstream and relays status and raw body back.

use axum::Extension;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Response, Uri, header};
use receiver_gateway_core::Session;
use receiver_gateway_upstream::{ForwardRequest, outbound_body};

use crate::app_state::SharedState;
use crate::error::ApiError;
use crate::routes::RECEIVER_PREFIX;

/// The part of the inbound path after the receiver prefix, `/` if nothing is left.
pub fn path_suffix(path: &str) -> &str {
    match path.strip_prefix(RECEIVER_PREFIX) {
        Some("") | None => "/",
        Some(rest) => rest,
    }
}

/// ANY /api/receiver/* - Forward an authenticated request to the receiver API.
pub async fn forward(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response<Body>, ApiError> {
    let outbound = outbound_body(&method, &body).inspect_err(|_| {
        tracing::warn!(session_id = %session.id, method = %method, "rejected malformed JSON body");
    })?;

    let request = ForwardRequest {
        method: method.clone(),
        path: path_suffix(uri.path()).to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: outbound,
    };

    let upstream = state.upstream.forward(request).await.inspect_err(|e| {
        tracing::warn!(
            session_id = %session.id,
            method = %method,
            path = %uri.path(),
            error = %e,
            "receiver API unreachable"
        );
    })?;

    tracing::info!(
        session_id = %session.id,
        method = %method,
        path = %uri.path(),
        status = %upstream.status,
        "relayed receiver response"
    );

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    if let Some(content_type) = upstream.content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}
