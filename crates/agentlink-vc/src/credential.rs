//! # AgentLink Credential Structure
//!
//! Defines [`AgentVc`], the credential binding a verified human to an agent
//! wallet, and its parts.
//!
//! ## Security Invariants
//!
//! - [`HumanProof`] cannot be empty. It is a sum type with no "neither"
//!   variant, and deserializing a document whose `humanProof` has neither
//!   `selfId` nor `worldId` fails.
//! - Only the minimal proof fields (nullifier, attestation id or
//!   verification level, timestamp) live in a credential. Raw proof blobs
//!   from the identity record are never copied in.
//! - `signature`, `signerAddress`, `signedAt`, `status`, `anchor` and
//!   `revocation` are envelope fields; they are excluded from the credential
//!   hash (see [`crate::hash`]).

use agentlink_core::{
    AttestationId, ChainAddress, IdentityRecord, Nullifier, Timestamp, ValidationError,
    VerificationLevel, VcId,
};
use agentlink_crypto::RecoverableSignature;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a credential.
///
/// ```text
/// Draft ──▶ Issued ──▶ Signed ──▶ Anchored
///              │          │          │
///              └──────────┴──────────┴──▶ Revoked (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcStatus {
    /// Assembled, not yet accepted by the issuer.
    Draft,
    /// Accepted by the issuer, awaiting signature.
    Issued,
    /// Carries a signature over its hash.
    Signed,
    /// Hash recorded on-chain by an external collaborator.
    Anchored,
    /// Withdrawn (terminal).
    Revoked,
}

impl VcStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether the lifecycle permits moving from `self` to `to`.
    pub fn can_transition_to(&self, to: VcStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Issued)
                | (Self::Issued, Self::Signed)
                | (Self::Signed, Self::Anchored)
                | (Self::Issued | Self::Signed | Self::Anchored, Self::Revoked)
        )
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Signed => "signed",
            Self::Anchored => "anchored",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for VcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Human Proof ─────────────────────────────────────────────────────

/// Minimal Self Protocol proof carried in a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelfIdProof {
    pub attestation_id: AttestationId,
    pub nullifier: Nullifier,
    pub verified_at: Timestamp,
}

/// Minimal World ID proof carried in a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorldIdProof {
    pub nullifier_hash: Nullifier,
    pub verification_level: VerificationLevel,
    pub verified_at: Timestamp,
}

/// At least one verified human identity proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HumanProofRepr", into = "HumanProofRepr")]
pub enum HumanProof {
    /// Self Protocol only.
    SelfOnly(SelfIdProof),
    /// World ID only.
    WorldOnly(WorldIdProof),
    /// Both verifiers.
    Both {
        self_id: SelfIdProof,
        world_id: WorldIdProof,
    },
}

/// Wire shape: an object with optional `selfId` and `worldId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct HumanProofRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_id: Option<SelfIdProof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    world_id: Option<WorldIdProof>,
}

impl HumanProof {
    /// Build from optional parts. Fails if both are absent.
    pub fn from_parts(
        self_id: Option<SelfIdProof>,
        world_id: Option<WorldIdProof>,
    ) -> Result<Self, ValidationError> {
        match (self_id, world_id) {
            (Some(self_id), Some(world_id)) => Ok(Self::Both { self_id, world_id }),
            (Some(s), None) => Ok(Self::SelfOnly(s)),
            (None, Some(w)) => Ok(Self::WorldOnly(w)),
            (None, None) => Err(ValidationError::MissingHumanProof),
        }
    }

    /// Extract the verified proofs from a stored identity record.
    ///
    /// Entries with `is_verified == false` are ignored; raw proof blobs are
    /// dropped.
    pub fn from_identity(record: &IdentityRecord) -> Result<Self, ValidationError> {
        let self_id = record.verified_self().map(|v| SelfIdProof {
            attestation_id: v.attestation_id,
            nullifier: v.nullifier.clone(),
            verified_at: v.verified_at,
        });
        let world_id = record.verified_world().map(|v| WorldIdProof {
            nullifier_hash: v.nullifier_hash.clone(),
            verification_level: v.verification_level,
            verified_at: v.verified_at,
        });
        Self::from_parts(self_id, world_id)
    }

    /// The Self Protocol part, if present.
    pub fn self_id(&self) -> Option<&SelfIdProof> {
        match self {
            Self::SelfOnly(s) | Self::Both { self_id: s, .. } => Some(s),
            Self::WorldOnly(_) => None,
        }
    }

    /// The World ID part, if present.
    pub fn world_id(&self) -> Option<&WorldIdProof> {
        match self {
            Self::WorldOnly(w) | Self::Both { world_id: w, .. } => Some(w),
            Self::SelfOnly(_) => None,
        }
    }
}

impl TryFrom<HumanProofRepr> for HumanProof {
    type Error = ValidationError;

    fn try_from(repr: HumanProofRepr) -> Result<Self, Self::Error> {
        Self::from_parts(repr.self_id, repr.world_id)
    }
}

impl From<HumanProof> for HumanProofRepr {
    fn from(proof: HumanProof) -> Self {
        match proof {
            HumanProof::SelfOnly(s) => Self {
                self_id: Some(s),
                world_id: None,
            },
            HumanProof::WorldOnly(w) => Self {
                self_id: None,
                world_id: Some(w),
            },
            HumanProof::Both { self_id, world_id } => Self {
                self_id: Some(self_id),
                world_id: Some(world_id),
            },
        }
    }
}

// ─── Envelope parts ──────────────────────────────────────────────────

/// The human's statement about the agent. Immutable after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub description: String,
    pub created_at: Timestamp,
}

/// Externally supplied on-chain anchoring metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub transaction_hash: String,
    pub chain_id: u64,
    pub anchored_at: Timestamp,
}

/// Why and when a credential was withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    pub reason: String,
    pub revoked_at: Timestamp,
}

/// Static provenance metadata stamped into every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerProfile {
    pub issuer: String,
    pub credential_schema: String,
    pub version: String,
    pub credential_types: Vec<String>,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            issuer: "did:web:agentlink".to_string(),
            credential_schema: "agentlink:schema:agent-link:v1".to_string(),
            version: "1.0".to_string(),
            credential_types: vec![
                "VerifiableCredential".to_string(),
                "AgentLinkCredential".to_string(),
            ],
        }
    }
}

// ─── AgentVc ─────────────────────────────────────────────────────────

/// A credential binding a verified human to an agent wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentVc {
    pub vc_id: VcId,
    pub version: String,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub credential_schema: String,
    pub issued_at: Timestamp,
    pub agent_id: ChainAddress,
    pub human_proof: HumanProof,
    pub declaration: Declaration,
    pub status: VcStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<RecoverableSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_address: Option<ChainAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<RevocationRecord>,
}

impl AgentVc {
    /// True once a signature has been attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a stored or distributed credential document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
