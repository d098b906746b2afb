// ABOUTME: Outbound side of receiver-gateway: builds and sends one upstream request per proxied call.
// ABOUTME: Owns the reqwest client, the body and header forwarding rules, and a stub upstream for tests.

pub mod body;
pub mod client;
pub mod error;
pub mod policy;
pub mod testing;

pub use body::{MalformedBody, outbound_body};
pub use client::{
    DEFAULT_MAX_RESPONSE_BYTES, ForwardRequest, UpstreamClient, UpstreamResponse, normalize_base_url,
};
pub use error::UpstreamError;
pub use policy::{HeaderPolicy, method_carries_body};
