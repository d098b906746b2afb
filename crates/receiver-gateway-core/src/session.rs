// ABOUTME: Session credentials: unguessable bearer tokens mapped to expiring sessions.
// ABOUTME: Provides the SessionStore abstraction and an in-memory implementation keyed by token.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use serde::Serialize;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::account::{Account, Role};

/// Number of random bytes behind every token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Opaque bearer token handed to a client after a successful login.
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a fresh token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// What a token proves: who logged in, as which role, and until when.
/// The ULID `id` is safe to log; the token is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Ulid,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A freshly issued token together with the session it unlocks.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub session: Session,
}

/// Issue, validate, and revoke session credentials.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session for the account and return its token.
    async fn issue(&self, account: &Account) -> IssuedSession;

    /// Return the live session for a token. Unknown and expired tokens
    /// both yield `None`.
    async fn validate(&self, token: &str) -> Option<Session>;

    /// Remove a session. Returns whether a live session was removed.
    async fn revoke(&self, token: &str) -> bool;

    /// Drop every expired session and return how many were removed.
    async fn purge_expired(&self) -> usize;
}

/// Process-local session map. Everything is lost on restart.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, Session>>,
    ttl: TimeDelta,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn issue(&self, account: &Account) -> IssuedSession {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session {
            id: Ulid::new(),
            username: account.username.clone(),
            role: account.role,
            issued_at,
            expires_at,
        };
        let token = SessionToken::generate();

        self.sessions
            .write()
            .await
            .insert(token.clone(), session.clone());

        tracing::debug!(session_id = %session.id, username = %session.username, "session issued");
        IssuedSession { token, session }
    }

    async fn validate(&self, token: &str) -> Option<Session> {
        let key = SessionToken(token.to_string());
        let now = Utc::now();

        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                None => return None,
                Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case a
        // concurrent revoke already removed it.
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(&key)
            && session.is_expired_at(now)
        {
            tracing::debug!(session_id = %session.id, "session expired");
            sessions.remove(&key);
        }
        None
    }

    async fn revoke(&self, token: &str) -> bool {
        let key = SessionToken(token.to_string());
        let removed = self.sessions.write().await.remove(&key);
        match removed {
            Some(session) => {
                tracing::debug!(session_id = %session.id, "session revoked");
                !session.is_expired_at(Utc::now())
            }
            None => false,
        }
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }
}
