// ABOUTME: Account and Role types plus the AccountStore lookup abstraction.
// ABOUTME: Accounts are provisioned once at startup and never change for the life of the process.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// The closed set of roles an account can hold. Reported to clients on
/// login; the gateway itself never authorizes by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}', expected 'admin' or 'user'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A registered principal. The password is held in plaintext and compared
/// in constant time; it is never printed by `Debug`.
#[derive(Clone)]
pub struct Account {
    pub username: String,
    password: String,
    pub role: Role,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    /// Exact, case-sensitive password comparison.
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Lookup of accounts by exact username.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, username: &str) -> Option<Account>;
}

/// Read-only account set built from configuration at startup.
#[derive(Debug, Default)]
pub struct StaticAccountStore {
    accounts: HashMap<String, Account>,
}

impl StaticAccountStore {
    /// Build a store from the given accounts. If a username repeats, the
    /// last entry wins; configuration loading rejects duplicates before this.
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (account.username.clone(), account))
            .collect();
        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for StaticAccountStore {
    async fn find_account(&self, username: &str) -> Option<Account> {
        self.accounts.get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticAccountStore {
        StaticAccountStore::new(vec![
            Account::new("admin", "adminpass", Role::Admin),
            Account::new("viewer", "viewerpass", Role::User),
        ])
    }

    #[test]
    fn role_parses_only_lowercase_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);

        let err = "Admin".parse::<Role>().unwrap_err();
        assert_eq!(err, ParseRoleError("Admin".to_string()));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let back: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(back, Role::User);
    }

    #[test]
    fn password_comparison_is_exact() {
        let account = Account::new("admin", "adminpass", Role::Admin);
        assert!(account.password_matches("adminpass"));
        assert!(!account.password_matches("AdminPass"));
        assert!(!account.password_matches("adminpass "));
        assert!(!account.password_matches(""));
    }

    #[test]
    fn debug_output_hides_password() {
        let account = Account::new("admin", "adminpass", Role::Admin);
        let printed = format!("{:?}", account);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("adminpass"));
    }

    #[tokio::test]
    async fn find_account_is_case_sensitive() {
        let store = store();
        assert_eq!(store.len(), 2);

        let found = store.find_account("admin").await.unwrap();
        assert_eq!(found.role, Role::Admin);

        assert!(store.find_account("ADMIN").await.is_none());
        assert!(store.find_account("nobody").await.is_none());
    }
}
