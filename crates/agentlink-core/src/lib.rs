//! # agentlink-core — Foundational Types for AgentLink
//!
//! AgentLink issues Verifiable Credentials that bind a human's identity
//! proofs (World ID, Self Protocol) to an on-chain agent wallet. This crate
//! holds the primitives every other crate builds on; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every credential hash flows through
//!    `CanonicalBytes::new()` / `CanonicalBytes::from_value()`. Two
//!    credentials that differ only in key insertion order produce the same
//!    bytes and therefore the same hash.
//!
//! 2. **Digests accept only `&CanonicalBytes`.** `keccak256_digest()` and
//!    `sha256_digest()` cannot be called on raw JSON text.
//!
//! 3. **Validated identifiers.** `ChainAddress`, `VcId`, `UserId` and
//!    `Nullifier` are newtypes with checked constructors. An agent address
//!    that fails EIP-55 or hex validation never reaches the assembler.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is second-precision UTC with a
//!    `Z` suffix so timestamps canonicalize identically everywhere.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `agentlink-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod human;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{keccak256, keccak256_digest, sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{AgentLinkError, CanonicalizationError, ValidationError};
pub use human::{
    AttestationId, AttestationKind, IdentityRecord, SelfIdVerification, VerificationLevel,
    WorldIdVerification,
};
pub use identity::{ChainAddress, Nullifier, UserId, VcId};
pub use temporal::Timestamp;
