//! # Credential Hash
//!
//! The signing target of a credential: Keccak-256 over the JCS bytes of the
//! credential with its envelope fields removed.
//!
//! ## Security Invariant
//!
//! The stripped set is fixed. `signature` and `signedAt` have to go so that
//! signing is not self-referential; `signerAddress`, `status`, `anchor` and
//! `revocation` go so that the hash stays the same from issuance through
//! revocation. Everything else, including fields this build does not know
//! about, is hashed.

use agentlink_core::{keccak256_digest, CanonicalBytes, ContentDigest};
use serde_json::Value;

use crate::credential::AgentVc;
use crate::error::VcError;

/// Top-level fields excluded from the credential hash.
pub const UNSIGNED_FIELDS: &[&str] = &[
    "signature",
    "signedAt",
    "signerAddress",
    "status",
    "anchor",
    "revocation",
];

/// Canonical bytes of the hashed portion of a credential document.
pub fn signing_input_value(doc: &Value) -> Result<CanonicalBytes, VcError> {
    let mut body = doc.clone();
    if let Some(obj) = body.as_object_mut() {
        for field in UNSIGNED_FIELDS {
            obj.remove(*field);
        }
    }
    Ok(CanonicalBytes::from_value(body)?)
}

/// Hash an arbitrary credential document as received.
///
/// Used when verifying a document that did not come through [`AgentVc`],
/// so unknown or reordered fields are hashed exactly as they appear.
pub fn canonical_hash_value(doc: &Value) -> Result<ContentDigest, VcError> {
    Ok(keccak256_digest(&signing_input_value(doc)?))
}

/// Hash a credential.
pub fn canonical_hash(vc: &AgentVc) -> Result<ContentDigest, VcError> {
    canonical_hash_value(&vc.to_value()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "vcId": "vc_1_abcdefghi",
            "agentId": "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
            "declaration": {"description": "d", "createdAt": "2026-01-01T00:00:00Z"},
            "status": "issued"
        })
    }

    #[test]
    fn envelope_fields_do_not_change_the_hash() {
        let base = canonical_hash_value(&doc()).unwrap();
        let mut signed = doc();
        let obj = signed.as_object_mut().unwrap();
        obj.insert("status".into(), json!("anchored"));
        obj.insert("signature".into(), json!("0xabc"));
        obj.insert("signedAt".into(), json!("2026-01-02T00:00:00Z"));
        obj.insert("signerAddress".into(), json!("0x01"));
        obj.insert("anchor".into(), json!({"transactionHash": "0x1", "chainId": 1}));
        obj.insert("revocation".into(), json!({"reason": "r"}));
        assert_eq!(canonical_hash_value(&signed).unwrap(), base);
    }

    #[test]
    fn body_fields_change_the_hash() {
        let base = canonical_hash_value(&doc()).unwrap();
        let mut tampered = doc();
        tampered["declaration"]["description"] = json!("e");
        assert_ne!(canonical_hash_value(&tampered).unwrap(), base);

        let mut extra = doc();
        extra["note"] = json!("unknown field");
        assert_ne!(canonical_hash_value(&extra).unwrap(), base);
    }

    #[test]
    fn nested_fields_named_like_envelope_fields_are_kept() {
        let mut a = doc();
        a["declaration"]["status"] = json!("x");
        assert_ne!(
            canonical_hash_value(&a).unwrap(),
            canonical_hash_value(&doc()).unwrap()
        );
    }

    #[test]
    fn key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(
            r#"{"vcId":"v","agentId":"a","declaration":{"description":"d","createdAt":"t"}}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"declaration":{"createdAt":"t","description":"d"},"agentId":"a","vcId":"v"}"#,
        )
        .unwrap();
        assert_eq!(
            canonical_hash_value(&a).unwrap(),
            canonical_hash_value(&b).unwrap()
        );
    }

    #[test]
    fn floats_are_refused() {
        let mut d = doc();
        d["weight"] = json!(0.5);
        assert!(matches!(
            canonical_hash_value(&d),
            Err(VcError::Canonicalization(_))
        ));
    }
}
