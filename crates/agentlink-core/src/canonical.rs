//! # Canonical Serialization — JCS Byte Production
//!
//! `CanonicalBytes` is the sole construction path for bytes that feed a
//! credential hash.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only constructors run the value
//! through float rejection and then RFC 8785 (JSON Canonicalization Scheme)
//! serialization:
//!
//! - object keys sorted at every nesting level,
//! - arrays kept in element order (order is meaningful),
//! - compact separators, UTF-8 output, no trailing whitespace.
//!
//! Producers of credential JSON (browsers, document stores, other services)
//! do not agree on key order. Hashing anything other than canonical bytes
//! would make the signing target depend on who serialized the document last.
//!
//! Floats are rejected outright: JCS number formatting for non-integers is
//! the one place independent implementations routinely disagree, and nothing
//! in a credential needs a fractional number.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - Object keys are sorted lexicographically at every depth.
/// - Array element order is preserved.
/// - No float values are present.
/// - Output is valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number; `SerializationFailed` if serde cannot produce JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Canonicalize an already-built JSON value.
    ///
    /// Used by the credential hasher after it strips unsigned envelope
    /// fields from the serialized document.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as the JSON text they encode.
    pub fn as_str(&self) -> &str {
        // JCS output is built from a `String`, so this cannot fail.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_top_level_keys() {
        let data = serde_json::json!({"vcId": "vc_1", "agentId": "0xabc", "issuer": "x"});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(cb.as_str(), r#"{"agentId":"0xabc","issuer":"x","vcId":"vc_1"}"#);
    }

    #[test]
    fn sorts_nested_keys_and_keeps_array_order() {
        let data = serde_json::json!({
            "humanProof": {"worldId": {"verificationLevel": "orb", "nullifierHash": "0xabc"}},
            "type": ["VerifiableCredential", "AgentLinkCredential"]
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(
            cb.as_str(),
            r#"{"humanProof":{"worldId":{"nullifierHash":"0xabc","verificationLevel":"orb"}},"type":["VerifiableCredential","AgentLinkCredential"]}"#
        );
    }

    #[test]
    fn key_order_in_source_text_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":{"y":1,"x":2},"a":[1,2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":[1,2],"b":{"x":2,"y":1}}"#).unwrap();
        assert_eq!(
            CanonicalBytes::from_value(a).unwrap(),
            CanonicalBytes::from_value(b).unwrap()
        );
    }

    #[test]
    fn array_order_is_significant() {
        let a = CanonicalBytes::new(&serde_json::json!([1, 2])).unwrap();
        let b = CanonicalBytes::new(&serde_json::json!([2, 1])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_floats_at_any_depth() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.25}]}});
        match CanonicalBytes::new(&data) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 3.25),
            other => panic!("expected FloatRejected, got {other:?}"),
        }
    }

    #[test]
    fn accepts_integers_and_null() {
        let data = serde_json::json!({"n": -42, "big": 9999999999i64, "none": null});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"big":9999999999,"n":-42,"none":null}"#);
    }

    #[test]
    fn non_ascii_passes_through_as_utf8() {
        let data = serde_json::json!({"description": "agent de négociation"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert!(cb.as_str().contains("négociation"));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(), b"[]");
        assert!(!CanonicalBytes::new(&serde_json::json!({})).unwrap().is_empty());
    }
}
