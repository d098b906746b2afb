// ABOUTME: Credential issuer that turns a username/password pair into a session token.
// ABOUTME: Looks accounts up through AccountStore and mints tokens through SessionStore.

use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::account::AccountStore;
use crate::error::AuthError;
use crate::session::{IssuedSession, SessionStore};

/// Compared against when the username is unknown, so a miss costs the same
/// password comparison as a hit. Matching it never authenticates anyone.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Validates logins and issues session credentials. Both stores are
/// injected so tests and future backends can swap them.
#[derive(Clone)]
pub struct CredentialIssuer {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
}

impl CredentialIssuer {
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { accounts, sessions }
    }

    /// Authenticate a username/password pair.
    ///
    /// Both fields are compared exactly. An unknown user and a wrong
    /// password produce the same `InvalidCredentials` error.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedSession, AuthError> {
        let account = match self.accounts.find_account(username).await {
            Some(account) if account.password_matches(password) => account,
            Some(_) => return Err(rejected(username)),
            None => {
                let _: bool = DECOY_PASSWORD.as_bytes().ct_eq(password.as_bytes()).into();
                return Err(rejected(username));
            }
        };

        let issued = self.sessions.issue(&account).await;
        tracing::info!(
            username = %account.username,
            role = %account.role,
            session_id = %issued.session.id,
            "login succeeded"
        );
        Ok(issued)
    }
}

fn rejected(username: &str) -> AuthError {
    tracing::warn!(username = %username, "login rejected");
    AuthError::InvalidCredentials
}
