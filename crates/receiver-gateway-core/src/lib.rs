// ABOUTME: Domain layer for receiver-gateway: accounts, sessions, and credential issuance.
// ABOUTME: Holds no HTTP code; the server crate wires these types into request handling.

pub mod account;
pub mod error;
pub mod issuer;
pub mod session;

pub use account::{Account, AccountStore, ParseRoleError, Role, StaticAccountStore};
pub use error::AuthError;
pub use issuer::CredentialIssuer;
pub use session::{InMemorySessionStore, IssuedSession, Session, SessionStore, SessionToken};
