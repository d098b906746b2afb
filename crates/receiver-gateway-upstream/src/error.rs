// ABOUTME: Error type for upstream calls and upstream configuration.
// ABOUTME: Every transport-level variant is reported to clients as a single 502.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream base URL '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("could not connect to upstream")]
    Connect(#[source] reqwest::Error),

    #[error("upstream transport error")]
    Transport(#[source] reqwest::Error),

    #[error("upstream response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl UpstreamError {
    /// Sort a reqwest failure into timeout, connect, or generic transport.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err)
        } else if err.is_connect() {
            UpstreamError::Connect(err)
        } else {
            UpstreamError::Transport(err)
        }
    }

    /// True for failures that happened while talking to the upstream, as
    /// opposed to configuration problems caught at startup.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout(_)
                | UpstreamError::Connect(_)
                | UpstreamError::Transport(_)
                | UpstreamError::BodyTooLarge { .. }
        )
    }
}
