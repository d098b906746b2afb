// ABOUTME: Body rule for proxied requests: parse inbound JSON and re-serialize it for the upstream.
// ABOUTME: Methods that do not carry a payload send nothing, whatever the client provided.

use http::Method;
use serde_json::Value;
use thiserror::Error;

use crate::policy::method_carries_body;

/// A payload that cannot be sent upstream as a JSON document.
#[derive(Debug, Error)]
pub enum MalformedBody {
    #[error("Malformed JSON body")]
    Syntax(#[source] serde_json::Error),

    /// Top-level strings, numbers, booleans and `null` are refused.
    #[error("Malformed JSON body")]
    NotObjectOrArray,
}

/// Compute the bytes to send upstream for a proxied request.
///
/// For POST/PUT/PATCH the inbound bytes are parsed as JSON (an empty body
/// counts as `{}`) and serialized again with object keys in their original
/// order. The document root must be an object or an array. Every other
/// method yields `None`.
pub fn outbound_body(method: &Method, raw: &[u8]) -> Result<Option<Vec<u8>>, MalformedBody> {
    if !method_carries_body(method) {
        return Ok(None);
    }

    let parsed: Value = if raw.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(raw).map_err(MalformedBody::Syntax)?
    };

    if !matches!(parsed, Value::Object(_) | Value::Array(_)) {
        return Err(MalformedBody::NotObjectOrArray);
    }

    serde_json::to_vec(&parsed)
        .map(Some)
        .map_err(MalformedBody::Syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_delete_head_send_no_body() {
        let raw = br#"{"key":"abc"}"#;
        for method in [Method::GET, Method::DELETE, Method::HEAD] {
            assert!(outbound_body(&method, raw).unwrap().is_none(), "{method}");
        }
    }

    #[test]
    fn body_is_reserialized_json() {
        let raw = br#"{ "key" : "abc",
                       "count": 3 }"#;
        let expected = serde_json::to_vec(&serde_json::from_slice::<Value>(raw).unwrap()).unwrap();

        for method in [Method::POST, Method::PUT, Method::PATCH] {
            let body = outbound_body(&method, raw).unwrap().unwrap();
            assert_eq!(body, expected);
        }
        assert!(!expected.contains(&b'\n'));
    }

    #[test]
    fn empty_body_becomes_empty_object() {
        assert_eq!(outbound_body(&Method::POST, b"").unwrap().unwrap(), b"{}");
        assert_eq!(outbound_body(&Method::PUT, b"  \n").unwrap().unwrap(), b"{}");
    }

    #[test]
    fn non_json_body_is_rejected_only_when_it_would_be_sent() {
        assert!(outbound_body(&Method::POST, b"key=abc").is_err());
        assert!(outbound_body(&Method::GET, b"key=abc").unwrap().is_none());
    }

    #[test]
    fn array_bodies_pass_through() {
        assert_eq!(outbound_body(&Method::POST, b"[1, 2]").unwrap().unwrap(), b"[1,2]");
        assert_eq!(outbound_body(&Method::PUT, b"[]").unwrap().unwrap(), b"[]");
    }

    #[test]
    fn scalar_roots_are_rejected() {
        for raw in [&b"\"x\""[..], b"42", b"true", b"null"] {
            let err = outbound_body(&Method::PATCH, raw).unwrap_err();
            assert!(matches!(err, MalformedBody::NotObjectOrArray), "{raw:?}");
            assert_eq!(err.to_string(), "Malformed JSON body");
        }
        // Scalars on bodiless methods are never inspected.
        assert!(outbound_body(&Method::GET, b"42").unwrap().is_none());
    }

    #[test]
    fn object_key_order_is_preserved() {
        let raw = br#"{ "streamId": "s1", "action": "start",
                       "config": { "z": 1, "a": 2 } }"#;
        let body = outbound_body(&Method::POST, raw).unwrap().unwrap();
        assert_eq!(
            body,
            br#"{"streamId":"s1","action":"start","config":{"z":1,"a":2}}"#
        );
    }
}
