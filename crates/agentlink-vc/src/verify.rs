//! # Credential Verification
//!
//! Recomputes the credential hash, recovers the address that produced the
//! signature and compares it to `signerAddress`.
//!
//! The result is tri-state. A credential with neither `signature` nor
//! `signerAddress` is [`VerificationOutcome::Unsigned`], not invalid. A bad
//! signature is a normal [`VerificationOutcome::Invalid`] value; verification
//! itself never fails.

use agentlink_core::{ChainAddress, ContentDigest};
use agentlink_crypto::{recover_message_signer, RecoverableSignature};
use serde::Serialize;
use serde_json::Value;

use crate::credential::AgentVc;
use crate::error::VcError;
use crate::hash::{canonical_hash, canonical_hash_value};

/// Why a signed credential failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum InvalidReason {
    /// The signature recovers to someone other than `signerAddress`.
    SignerMismatch,
    /// Only one of `signature` / `signerAddress` is present.
    Incomplete,
    /// The signature is not a recoverable secp256k1 signature.
    MalformedSignature(String),
    /// `signerAddress` is not a chain address.
    MalformedSignerAddress(String),
    /// The document body could not be canonicalized.
    Unhashable(String),
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignerMismatch => f.write_str("signature does not match signer address"),
            Self::Incomplete => f.write_str("signature and signer address must both be present"),
            Self::MalformedSignature(d) => write!(f, "malformed signature: {d}"),
            Self::MalformedSignerAddress(d) => write!(f, "malformed signer address: {d}"),
            Self::Unhashable(d) => write!(f, "credential cannot be hashed: {d}"),
        }
    }
}

/// Result of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum VerificationOutcome {
    /// No signature yet.
    Unsigned,
    /// The signature recovers to the claimed signer.
    Valid {
        signer: ChainAddress,
        hash: ContentDigest,
    },
    /// The signature does not check out.
    Invalid {
        reason: InvalidReason,
        /// The address the signature recovered to, when recovery succeeded.
        #[serde(skip_serializing_if = "Option::is_none")]
        recovered: Option<ChainAddress>,
    },
}

impl VerificationOutcome {
    /// True only for [`VerificationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    fn invalid(reason: InvalidReason) -> Self {
        Self::Invalid {
            reason,
            recovered: None,
        }
    }
}

/// Verify a typed credential.
pub fn verify_vc(vc: &AgentVc) -> VerificationOutcome {
    match (&vc.signature, &vc.signer_address) {
        (None, None) => VerificationOutcome::Unsigned,
        (Some(sig), Some(claimed)) => check(canonical_hash(vc), sig, claimed),
        _ => VerificationOutcome::invalid(InvalidReason::Incomplete),
    }
}

/// Verify a credential document exactly as received.
///
/// The hash covers the document's own body, so unknown fields and
/// non-canonical casing are part of what was signed.
pub fn verify_value(doc: &Value) -> VerificationOutcome {
    let field = |name: &str| doc.get(name).filter(|v| !v.is_null());
    let (sig, claimed) = match (field("signature"), field("signerAddress")) {
        (None, None) => return VerificationOutcome::Unsigned,
        (Some(s), Some(a)) => (s, a),
        _ => return VerificationOutcome::invalid(InvalidReason::Incomplete),
    };

    let sig = match sig.as_str().map(RecoverableSignature::from_hex) {
        Some(Ok(sig)) => sig,
        Some(Err(e)) => {
            return VerificationOutcome::invalid(InvalidReason::MalformedSignature(e.to_string()))
        }
        None => {
            return VerificationOutcome::invalid(InvalidReason::MalformedSignature(
                "not a string".to_string(),
            ))
        }
    };

    // Case-insensitive: a lowercased address skips the checksum check.
    let claimed = match claimed
        .as_str()
        .map(|s| ChainAddress::parse(&s.to_ascii_lowercase()))
    {
        Some(Ok(addr)) => addr,
        Some(Err(e)) => {
            return VerificationOutcome::invalid(InvalidReason::MalformedSignerAddress(
                e.to_string(),
            ))
        }
        None => {
            return VerificationOutcome::invalid(InvalidReason::MalformedSignerAddress(
                "not a string".to_string(),
            ))
        }
    };

    check(canonical_hash_value(doc), &sig, &claimed)
}

fn check(
    hash: Result<ContentDigest, VcError>,
    sig: &RecoverableSignature,
    claimed: &ChainAddress,
) -> VerificationOutcome {
    let hash = match hash {
        Ok(h) => h,
        Err(e) => return VerificationOutcome::invalid(InvalidReason::Unhashable(e.to_string())),
    };
    match recover_message_signer(&hash.bytes, sig) {
        Ok(recovered) if recovered == *claimed => VerificationOutcome::Valid {
            signer: recovered,
            hash,
        },
        Ok(recovered) => VerificationOutcome::Invalid {
            reason: InvalidReason::SignerMismatch,
            recovered: Some(recovered),
        },
        Err(e) => VerificationOutcome::invalid(InvalidReason::MalformedSignature(e.to_string())),
    }
}
