//! Identity verifier error types.

use agentlink_core::Nullifier;

/// Errors from the identity verifier collaborators.
///
/// Upstream failures are surfaced as-is and never retried: a World ID or
/// Self proof is single-use, and a blind retry can burn it.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// Transport failure or a 5xx from the verifier.
    #[error("verifier {endpoint} unreachable: {detail}")]
    Unreachable { endpoint: String, detail: String },
    /// The verifier did not answer within the configured timeout.
    #[error("verifier {endpoint} timed out")]
    Timeout { endpoint: String },
    /// The verifier looked at the proof and said no.
    #[error("verifier {endpoint} rejected the proof ({status} {code}): {detail}")]
    Rejected {
        endpoint: String,
        status: u16,
        code: String,
        detail: String,
    },
    /// The verifier answered with something we could not parse.
    #[error("failed to deserialize response from {endpoint}: {detail}")]
    Deserialization { endpoint: String, detail: String },
    /// The nullifier is already bound to a different user.
    #[error("nullifier {nullifier} is already bound to another user")]
    NullifierReused { nullifier: Nullifier },
    /// The proof submission itself is malformed.
    #[error("invalid proof submission: {0}")]
    InvalidSubmission(String),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl VerifierError {
    /// Stable machine-readable code for client responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. }
            | Self::Timeout { .. }
            | Self::Rejected { .. }
            | Self::Deserialization { .. } => "UPSTREAM_ERROR",
            Self::NullifierReused { .. } => "NULLIFIER_REUSED",
            Self::InvalidSubmission(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the caller did something wrong, as opposed to a dependency
    /// failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::NullifierReused { .. } | Self::InvalidSubmission(_)
        )
    }
}
