// ABOUTME: Shared application state for the gateway HTTP server.
// ABOUTME: Bundles the credential issuer, session store, and upstream client; built from config or injected for tests.

use std::sync::Arc;
use std::time::Duration;

use receiver_gateway_core::{
    AccountStore, CredentialIssuer, InMemorySessionStore, SessionStore, StaticAccountStore,
};
use receiver_gateway_upstream::{UpstreamClient, UpstreamError};
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub issuer: CredentialIssuer,
    pub sessions: Arc<dyn SessionStore>,
    pub upstream: UpstreamClient,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state from explicitly owned stores and an upstream client.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        upstream: UpstreamClient,
    ) -> Self {
        Self {
            issuer: CredentialIssuer::new(accounts, Arc::clone(&sessions)),
            sessions,
            upstream,
        }
    }

    /// Build production state: static accounts from config, in-memory
    /// sessions, and a pooled upstream client.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let accounts = Arc::new(StaticAccountStore::new(config.accounts.clone()));
        let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl));
        let upstream = UpstreamClient::new(
            &config.upstream_url,
            config.upstream_timeout,
            config.forward_headers.clone(),
        )?
        .with_max_body_bytes(config.max_response_bytes);
        Ok(Self::new(accounts, sessions, upstream))
    }
}

/// Periodically drop expired sessions so abandoned logins do not pile up.
pub fn spawn_session_sweeper(state: &SharedState, every: Duration) -> JoinHandle<()> {
    let sessions = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "purged expired sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use receiver_gateway_core::{Account, Role};
    use receiver_gateway_upstream::HeaderPolicy;

    #[tokio::test]
    async fn from_config_wires_accounts_into_issuer() {
        let config = GatewayConfig::from_lookup(|key| match key {
            "GATEWAY_ACCOUNTS" => Some("ops:pw:user".to_string()),
            "RECEIVER_API" => Some("http://127.0.0.1:9/".to_string()),
            "GATEWAY_MAX_RESPONSE_BYTES" => Some("2048".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_config(&config).unwrap();

        assert_eq!(state.upstream.base_url(), "http://127.0.0.1:9");
        assert_eq!(state.upstream.max_body_bytes(), 2048);
        let issued = state.issuer.authenticate("ops", "pw").await.unwrap();
        assert_eq!(issued.session.role, Role::User);
        assert!(state.sessions.validate(issued.token.as_str()).await.is_some());
        assert!(state.issuer.authenticate("admin", "adminpass").await.is_err());
    }

    #[tokio::test]
    async fn sweeper_purges_expired_sessions() {
        let sessions = Arc::new(InMemorySessionStore::new(Duration::ZERO));
        let accounts = Arc::new(StaticAccountStore::new(vec![Account::new(
            "admin",
            "adminpass",
            Role::Admin,
        )]));
        let upstream = UpstreamClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(1),
            HeaderPolicy::none(),
        )
        .unwrap();
        let state: SharedState = Arc::new(AppState::new(
            accounts,
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            upstream,
        ));

        state.issuer.authenticate("admin", "adminpass").await.unwrap();
        assert_eq!(sessions.len().await, 1);

        let sweeper = spawn_session_sweeper(&state, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.abort();

        assert!(sessions.is_empty().await);
    }
}
