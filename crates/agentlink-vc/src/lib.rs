//! # agentlink-vc — Agent-Link Verifiable Credentials
//!
//! The credential pipeline:
//!
//! 1. [`assemble`](assemble::assemble) a `draft` credential from an agent
//!    address, the human's verified identity record and a declaration.
//! 2. [`canonical_hash`](hash::canonical_hash): Keccak-256 over the JCS bytes
//!    of the credential minus its envelope fields.
//! 3. [`sign_vc`](sign::sign_vc): EIP-191 personal-message signature over the
//!    32 hash bytes.
//! 4. [`verify_vc`](verify::verify_vc): tri-state
//!    `Unsigned | Valid | Invalid` result.
//!
//! Lifecycle moves live in [`lifecycle`] as pure functions returning the
//! store writes they imply.
//!
//! ## Security Invariants
//!
//! - Every hash goes through [`CanonicalBytes`](agentlink_core::CanonicalBytes).
//! - A credential always carries at least one human proof.
//! - The hash of a credential never changes after assembly.

pub mod artifact;
pub mod assemble;
pub mod credential;
pub mod error;
pub mod hash;
pub mod lifecycle;
pub mod sign;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use artifact::SignedArtifact;
pub use assemble::{assemble, AssembleRequest};
pub use credential::{
    AgentVc, AnchorRecord, Declaration, HumanProof, IssuerProfile, RevocationRecord, SelfIdProof,
    VcStatus, WorldIdProof,
};
pub use error::VcError;
pub use hash::{canonical_hash, canonical_hash_value, UNSIGNED_FIELDS};
pub use lifecycle::{StoreEffect, Transition};
pub use sign::{sign_hash, sign_vc, SignatureEnvelope};
pub use verify::{verify_value, verify_vc, InvalidReason, VerificationOutcome};
