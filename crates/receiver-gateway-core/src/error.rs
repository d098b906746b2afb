// ABOUTME: Authentication error kinds shared by the issuer and the request guard.
// ABOUTME: Both kinds are terminal and surface to the client as HTTP 401.

use thiserror::Error;

/// Errors produced while authenticating a login or a proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username/password pair did not match any account. Unknown users and
    /// wrong passwords are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, unknown, or expired bearer token.
    #[error("Unauthorized")]
    Unauthorized,
}
