// ABOUTME: Single-attempt HTTP client for the receiver API with a bounded per-call timeout.
// ABOUTME: Maps a proxied request 1:1 onto an upstream request and returns status and raw body untouched.

use std::time::Duration;

use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, StatusCode};

use crate::error::UpstreamError;
use crate::policy::HeaderPolicy;

/// Upper bound on connection establishment, independent of the total budget.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest upstream response body buffered for relay unless configured otherwise.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Validate an upstream base URL and strip trailing slashes so suffixes
/// can be appended verbatim.
pub fn normalize_base_url(raw: &str) -> Result<String, UpstreamError> {
    let trimmed = raw.trim();
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| UpstreamError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(UpstreamError::InvalidUrl {
            url: raw.to_string(),
            reason: "base URL must not carry a query or fragment".to_string(),
        });
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// One proxied call, already reduced to what the upstream will see.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path after the gateway prefix, always starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Inbound headers; only allow-listed ones are forwarded.
    pub headers: HeaderMap,
    /// Bytes to send, already filtered by the body rule.
    pub body: Option<Vec<u8>>,
}

/// The upstream's answer, relayed verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Vec<u8>,
}

/// Pooled client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderPolicy,
    timeout: Duration,
    max_body_bytes: usize,
}

impl UpstreamClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        headers: HeaderPolicy,
    ) -> Result<Self, UpstreamError> {
        let base_url = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            client,
            base_url,
            headers,
            timeout,
            max_body_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Cap the upstream response body. Larger answers are abandoned and
    /// reported as `BodyTooLarge` instead of being buffered.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL + path suffix + query, with no rewriting.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("{}{}?{}", self.base_url, path, q),
            None => format!("{}{}", self.base_url, path),
        }
    }

    /// Send the request once. Any status the upstream answers with,
    /// including 4xx and 5xx, is a successful relay; only transport
    /// failures are errors.
    pub async fn forward(&self, req: ForwardRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.target_url(&req.path, req.query.as_deref());
        tracing::debug!(method = %req.method, url = %url, "forwarding to upstream");

        let mut builder = self
            .client
            .request(req.method.clone(), &url)
            .headers(self.headers.select(&req.headers))
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let mut response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %req.method, url = %url, error = %e, "upstream request failed");
            UpstreamError::from_transport(e)
        })?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let too_large = || {
            tracing::warn!(
                method = %req.method,
                url = %url,
                limit = self.max_body_bytes,
                "upstream body too large"
            );
            UpstreamError::BodyTooLarge {
                limit: self.max_body_bytes,
            }
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            tracing::warn!(method = %req.method, url = %url, error = %e, "reading upstream body failed");
            UpstreamError::from_transport(e)
        })? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(method = %req.method, url = %url, status = %status, "upstream responded");
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
