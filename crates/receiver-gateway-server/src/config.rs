// ABOUTME: Configuration loading and validation for the gateway server.
// ABOUTME: Reads environment variables, applies defaults, and rejects invalid values before startup.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use receiver_gateway_core::{Account, Role};
use receiver_gateway_upstream::{DEFAULT_MAX_RESPONSE_BYTES, HeaderPolicy, normalize_base_url};
use thiserror::Error;

const DEFAULT_UPSTREAM: &str = "http://receiver:8080";
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_ACCOUNTS: &str = "admin:adminpass:admin";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GATEWAY_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("RECEIVER_API is not a usable upstream URL: {0}")]
    InvalidUpstream(String),

    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidDuration { var: &'static str, value: String },

    #[error("GATEWAY_MAX_RESPONSE_BYTES must be a positive byte count, got '{0}'")]
    InvalidBodyLimit(String),

    #[error("GATEWAY_FORWARD_HEADERS contains an invalid header name: {0}")]
    InvalidHeader(String),

    #[error("GATEWAY_ACCOUNTS entry {index} is invalid: {reason}")]
    InvalidAccount { index: usize, reason: String },

    #[error("GATEWAY_ACCOUNTS defines no accounts; refusing to start with nobody able to log in")]
    NoAccounts,
}

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub session_ttl: Duration,
    pub max_response_bytes: usize,
    pub forward_headers: HeaderPolicy,
    pub accounts: Vec<Account>,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - RECEIVER_API: receiver API base URL (default: http://receiver:8080)
    /// - GATEWAY_BIND: socket address to bind (default: 0.0.0.0:8080)
    /// - GATEWAY_UPSTREAM_TIMEOUT_SECS: total budget per upstream call (default: 10)
    /// - GATEWAY_SESSION_TTL_SECS: session lifetime (default: 43200)
    /// - GATEWAY_MAX_RESPONSE_BYTES: largest upstream body relayed (default: 16777216)
    /// - GATEWAY_FORWARD_HEADERS: comma-separated client headers to pass upstream (default: none)
    /// - GATEWAY_ACCOUNTS: comma-separated `username:password:role` (default: admin:adminpass:admin)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_str = var("GATEWAY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str.clone()))?;

        let upstream_raw = var("RECEIVER_API").unwrap_or_else(|| DEFAULT_UPSTREAM.to_string());
        let upstream_url = normalize_base_url(&upstream_raw)
            .map_err(|e| ConfigError::InvalidUpstream(e.to_string()))?;

        let upstream_timeout = parse_secs(
            "GATEWAY_UPSTREAM_TIMEOUT_SECS",
            var("GATEWAY_UPSTREAM_TIMEOUT_SECS"),
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        let session_ttl = parse_secs(
            "GATEWAY_SESSION_TTL_SECS",
            var("GATEWAY_SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?;

        let max_response_bytes = match var("GATEWAY_MAX_RESPONSE_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::InvalidBodyLimit(raw)),
            },
            None => DEFAULT_MAX_RESPONSE_BYTES,
        };

        let forward_headers = match var("GATEWAY_FORWARD_HEADERS") {
            Some(list) => HeaderPolicy::allow(list.split(',').filter(|n| !n.trim().is_empty()))
                .map_err(|_| ConfigError::InvalidHeader(list.clone()))?,
            None => HeaderPolicy::none(),
        };

        let accounts = parse_accounts(
            &var("GATEWAY_ACCOUNTS").unwrap_or_else(|| DEFAULT_ACCOUNTS.to_string()),
        )?;

        Ok(Self {
            bind,
            upstream_url,
            upstream_timeout,
            session_ttl,
            max_response_bytes,
            forward_headers,
            accounts,
        })
    }
}

fn parse_secs(var: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidDuration { var, value }),
    }
}

/// Parse `username:password:role` entries separated by commas. The
/// password may itself contain `:`; the role is everything after the last one.
pub fn parse_accounts(raw: &str) -> Result<Vec<Account>, ConfigError> {
    let mut accounts = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in raw.split(',').map(str::trim).enumerate() {
        if entry.is_empty() {
            continue;
        }
        let invalid = |reason: &str| ConfigError::InvalidAccount {
            index,
            reason: reason.to_string(),
        };

        let (username, rest) = entry
            .split_once(':')
            .ok_or_else(|| invalid("expected username:password:role"))?;
        let (password, role) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected username:password:role"))?;

        if username.is_empty() {
            return Err(invalid("username is empty"));
        }
        if password.is_empty() {
            return Err(invalid("password is empty"));
        }
        let role = role
            .parse::<Role>()
            .map_err(|e| invalid(&e.to_string()))?;
        if !seen.insert(username.to_string()) {
            return Err(invalid("duplicate username"));
        }

        accounts.push(Account::new(username, password, role));
    }

    if accounts.is_empty() {
        return Err(ConfigError::NoAccounts);
    }
    Ok(accounts)
}
