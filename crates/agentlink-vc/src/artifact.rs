//! # Signed Artifact
//!
//! What downstream consumers receive: the signed credential document plus
//! its hash as a `0x`-prefixed `bytes32`, ready for off-chain distribution
//! or a later anchoring call.

use agentlink_core::{ContentDigest, DigestAlgorithm};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::credential::AgentVc;
use crate::error::VcError;
use crate::hash::canonical_hash;
use crate::verify::{verify_vc, VerificationOutcome};

/// A signed credential and its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedArtifact {
    pub vc: AgentVc,
    #[serde(serialize_with = "ser_hash", deserialize_with = "de_hash")]
    pub hash: ContentDigest,
}

impl SignedArtifact {
    /// Package a signed credential.
    ///
    /// # Errors
    ///
    /// `VcError::InvalidTransition` if `vc` carries no signature.
    pub fn from_vc(vc: AgentVc) -> Result<Self, VcError> {
        if !vc.is_signed() {
            return Err(VcError::InvalidTransition {
                from: vc.status,
                to: crate::credential::VcStatus::Signed,
            });
        }
        let hash = canonical_hash(&vc)?;
        Ok(Self { vc, hash })
    }

    /// Re-verify the packaged credential and check the packaged hash.
    pub fn verify(&self) -> VerificationOutcome {
        let outcome = verify_vc(&self.vc);
        match &outcome {
            VerificationOutcome::Valid { hash, .. } if *hash != self.hash => {
                VerificationOutcome::Invalid {
                    reason: crate::verify::InvalidReason::Unhashable(
                        "artifact hash does not match credential".to_string(),
                    ),
                    recovered: None,
                }
            }
            _ => outcome,
        }
    }
}

fn ser_hash<S: Serializer>(hash: &ContentDigest, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hash.to_prefixed_hex())
}

fn de_hash<'de, D: Deserializer<'de>>(d: D) -> Result<ContentDigest, D::Error> {
    let s = String::deserialize(d)?;
    ContentDigest::from_prefixed_hex(DigestAlgorithm::Keccak256, &s).map_err(serde::de::Error::custom)
}
