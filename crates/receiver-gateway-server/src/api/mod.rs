// ABOUTME: API module containing the HTTP handler functions of the gateway.
// ABOUTME: Split into session handling (login/logout) and the receiver API proxy.

pub mod receiver;
pub mod session;
