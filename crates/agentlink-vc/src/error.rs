//! # Credential Error Types

use agentlink_core::{CanonicalizationError, ChainAddress, ValidationError, VcId};
use agentlink_crypto::CryptoError;
use thiserror::Error;

use crate::credential::VcStatus;

/// Errors from credential assembly, hashing, signing and lifecycle moves.
///
/// Verification mismatches are not errors; see
/// [`VerificationOutcome`](crate::verify::VerificationOutcome).
#[derive(Error, Debug)]
pub enum VcError {
    /// Input rejected before anything was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The credential body could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The key provider could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// The lifecycle does not allow this move.
    #[error("invalid credential transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: VcStatus,
        /// Attempted status.
        to: VcStatus,
    },

    /// The credential already carries a signature.
    #[error("credential {0} is already signed")]
    AlreadySigned(VcId),

    /// A supplied signature does not recover to the required signer.
    #[error("signature recovers to {recovered}, expected {expected}")]
    SignerMismatch {
        /// The address the signature had to come from.
        expected: ChainAddress,
        /// The address it actually recovers to.
        recovered: ChainAddress,
    },
}

impl VcError {
    /// Stable machine-readable code for client responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::SignerMismatch { .. } => "VALIDATION_ERROR",
            Self::Signing(_) => "SIGNING_ERROR",
            Self::InvalidTransition { .. } | Self::AlreadySigned(_) => "INVALID_TRANSITION",
            Self::Canonicalization(_) | Self::Json(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_distinguish_caller_from_dependency() {
        assert_eq!(
            VcError::from(ValidationError::EmptyDeclaration).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            VcError::from(CryptoError::ProviderUnavailable("x".into())).code(),
            "SIGNING_ERROR"
        );
        let t = VcError::InvalidTransition {
            from: VcStatus::Revoked,
            to: VcStatus::Signed,
        };
        assert_eq!(t.code(), "INVALID_TRANSITION");
        assert_eq!(t.to_string(), "invalid credential transition: revoked -> signed");
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = VcError::from(ValidationError::MissingHumanProof);
        assert_eq!(err.to_string(), ValidationError::MissingHumanProof.to_string());
    }
}
