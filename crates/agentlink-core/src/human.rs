//! # Human Identity Records
//!
//! What the user directory knows about a human: their wallet and the
//! results of the identity verifiers (Self Protocol, World ID). These are
//! read-only inputs to credential assembly. A record with
//! `is_verified == true` is trusted as-is; the cryptographic checks
//! happened in the upstream verifier.

use serde::{Deserialize, Serialize};

use crate::identity::{ChainAddress, Nullifier, UserId};
use crate::temporal::Timestamp;

/// Self Protocol document attestation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationId(pub u32);

/// Decoded meaning of an [`AttestationId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationKind {
    /// Biometric passport (id 1).
    Passport,
    /// EU national identity card (id 2).
    EuIdCard,
    /// Indian Aadhaar (id 3).
    Aadhaar,
    /// Anything the verifier added after this build.
    Unknown(u32),
}

impl AttestationId {
    /// Decode the attestation type.
    pub fn kind(&self) -> AttestationKind {
        match self.0 {
            1 => AttestationKind::Passport,
            2 => AttestationKind::EuIdCard,
            3 => AttestationKind::Aadhaar,
            other => AttestationKind::Unknown(other),
        }
    }
}

impl std::fmt::Display for AttestationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// World ID credential strength, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    /// Iris scan at an Orb.
    Orb,
    /// NFC-read identity document with chip authentication.
    SecureDocument,
    /// NFC-read identity document.
    Document,
    /// Unique device only.
    Device,
}

impl VerificationLevel {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::SecureDocument => "secure_document",
            Self::Document => "document",
            Self::Device => "device",
        }
    }
}

impl std::fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a Self Protocol verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfIdVerification {
    pub is_verified: bool,
    pub attestation_id: AttestationId,
    pub nullifier: Nullifier,
    pub verified_at: Timestamp,
    /// Full proof blob as returned by the verifier. Never copied into a VC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_proof: Option<serde_json::Value>,
}

/// Outcome of a World ID verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldIdVerification {
    pub is_verified: bool,
    pub nullifier_hash: Nullifier,
    pub verification_level: VerificationLevel,
    pub verified_at: Timestamp,
    /// Full proof blob as returned by the verifier. Never copied into a VC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_proof: Option<serde_json::Value>,
}

/// A user's stored identity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<ChainAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_id_verification: Option<SelfIdVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_id_verification: Option<WorldIdVerification>,
}

impl IdentityRecord {
    /// A record with no verifications yet.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            wallet_address: None,
            self_id_verification: None,
            world_id_verification: None,
        }
    }

    /// The Self verification, if present and verified.
    pub fn verified_self(&self) -> Option<&SelfIdVerification> {
        self.self_id_verification.as_ref().filter(|v| v.is_verified)
    }

    /// The World ID verification, if present and verified.
    pub fn verified_world(&self) -> Option<&WorldIdVerification> {
        self.world_id_verification.as_ref().filter(|v| v.is_verified)
    }

    /// True if at least one verification is present and verified.
    pub fn has_verified_proof(&self) -> bool {
        self.verified_self().is_some() || self.verified_world().is_some()
    }
}
