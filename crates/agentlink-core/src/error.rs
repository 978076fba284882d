//! # Error Types
//!
//! Shared error hierarchy for AgentLink. Every variant uses `thiserror`.
//!
//! `ValidationError` is the "your input was invalid" class: callers surface
//! it as a rejected request and never retry it. Dependency failures live in
//! the crates that own the dependency (`CryptoError`, `VerifierError`,
//! `StoreError`).

use thiserror::Error;

/// Top-level error type for code that spans several concerns.
#[derive(Error, Debug)]
pub enum AgentLinkError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Content integrity violation (hash mismatch, tampered document).
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Lifecycle transition rejected.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Malformed input. Rejected immediately, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a `0x`-prefixed 20-byte hex address.
    #[error("invalid chain address {value:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Mixed-case address whose casing does not match its EIP-55 checksum.
    #[error("address {0:?} fails EIP-55 checksum")]
    AddressChecksum(String),

    /// The human declaration was empty or whitespace.
    #[error("declaration must not be empty")]
    EmptyDeclaration,

    /// The user has neither a verified Self ID nor a verified World ID.
    #[error("at least one verified identity proof (Self ID or World ID) is required")]
    MissingHumanProof,

    /// A required identifier was empty.
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),

    /// Malformed credential identifier.
    #[error("invalid VC id {0:?}")]
    InvalidVcId(String),

    /// Malformed or non-UTC timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Malformed digest string.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A caller-supplied signature that cannot be decoded or recovered.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

impl ValidationError {
    /// Stable machine-readable code for client responses.
    pub fn code(&self) -> &'static str {
        "VALIDATION_ERROR"
    }
}
