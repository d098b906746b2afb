// ABOUTME: Forwarding rules: which methods carry a body upstream and which client headers pass through.
// ABOUTME: Headers are dropped unless explicitly allow-listed; Content-Type is always fixed to JSON.

use http::header::{self, HeaderMap, HeaderName, InvalidHeaderName};
use http::Method;

/// Headers the gateway owns on the upstream request. They are never copied
/// from the client, even when allow-listed.
const RESERVED: [HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::HOST,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Only POST, PUT, and PATCH send a body upstream.
pub fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Allow-list of inbound header names copied onto the upstream request.
#[derive(Debug, Clone, Default)]
pub struct HeaderPolicy {
    allowed: Vec<HeaderName>,
}

impl HeaderPolicy {
    /// Forward no client headers at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a policy from header names. Names are matched
    /// case-insensitively; reserved names are silently ignored.
    pub fn allow<I, S>(names: I) -> Result<Self, InvalidHeaderName>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = Vec::new();
        for name in names {
            let name = HeaderName::from_bytes(name.as_ref().trim().as_bytes())?;
            if RESERVED.contains(&name) {
                tracing::warn!(header = %name, "ignoring reserved header in forwarding allow-list");
                continue;
            }
            if !allowed.contains(&name) {
                allowed.push(name);
            }
        }
        Ok(Self { allowed })
    }

    pub fn allowed(&self) -> &[HeaderName] {
        &self.allowed
    }

    /// Pick the allow-listed headers out of an inbound header map,
    /// keeping every value of multi-valued headers.
    pub fn select(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut selected = HeaderMap::new();
        for name in &self.allowed {
            for value in inbound.get_all(name) {
                selected.append(name.clone(), value.clone());
            }
        }
        selected
    }
}
