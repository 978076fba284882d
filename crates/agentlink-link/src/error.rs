//! # Link Error Types
//!
//! [`LinkError`] is what callers of the link service see. Every variant has
//! a stable machine code, and [`ErrorBody`] is the client-facing rendering:
//! input problems are described, dependency failures get a generic message
//! and are logged instead.

use agentlink_core::{ChainAddress, UserId, ValidationError, VcId};
use agentlink_vc::{AgentVc, VcError, VcStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SignerMode;

/// Errors from a credential store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A credential already links this agent and user.
    #[error("agent {agent_id} is already linked to user {user_id}")]
    Duplicate {
        agent_id: ChainAddress,
        user_id: UserId,
    },

    /// A credential with this id is already stored.
    #[error("credential {0} already exists")]
    IdCollision(VcId),

    /// No credential with this id.
    #[error("credential {0} not found")]
    NotFound(VcId),

    /// The stored record is not in the state the write expects.
    #[error("credential {vc_id} is {actual}, expected {expected}")]
    StatusConflict {
        vc_id: VcId,
        expected: VcStatus,
        actual: VcStatus,
    },

    /// The backing store failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from link orchestration.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The pair is already linked.
    #[error("agent {agent_id} is already linked to user {user_id}")]
    DuplicateLink {
        agent_id: ChainAddress,
        user_id: UserId,
    },

    /// The agent directory does not know this agent.
    #[error("agent {0} not found")]
    AgentNotFound(ChainAddress),

    /// The user directory does not know this user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Holder signing needs a wallet address on the user's record.
    #[error("user {0} has no wallet address to sign with")]
    HolderWalletMissing(UserId),

    /// The signature recovers to someone other than the required signer.
    #[error("signature recovers to {recovered}, expected {expected}")]
    SignerMismatch {
        expected: ChainAddress,
        recovered: ChainAddress,
    },

    /// The signer failed. `vc` is the credential still in `issued`, when
    /// one had been built, so the sign step can be retried on its own.
    #[error("signing failed: {detail}")]
    Signing {
        detail: String,
        vc: Option<Box<AgentVc>>,
    },

    /// A credential handed back for retry no longer matches the user's
    /// record or the issuer configuration.
    #[error("credential {vc_id} does not match the link it was issued for: {field}")]
    CredentialMismatch { vc_id: VcId, field: &'static str },

    /// The operation is not available in the configured signer mode.
    #[error("operation requires {0} signer mode")]
    WrongSignerMode(SignerMode),

    /// No credential with this id.
    #[error("credential {0} not found")]
    NotFound(VcId),

    /// The lifecycle does not allow this move.
    #[error("invalid credential transition: {from} -> {to}")]
    InvalidTransition { from: VcStatus, to: VcStatus },

    /// The credential already carries a signature.
    #[error("credential {0} is already signed")]
    AlreadySigned(VcId),

    /// The credential store failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Anything else that is our fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LinkError {
    /// Stable machine-readable code for client responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_)
            | Self::SignerMismatch { .. }
            | Self::HolderWalletMissing(_)
            | Self::CredentialMismatch { .. } => "VALIDATION_ERROR",
            Self::DuplicateLink { .. } => "DUPLICATE_LINK",
            Self::AgentNotFound(_) => "AGENT_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Signing { .. } => "SIGNING_ERROR",
            Self::WrongSignerMode(_) => "WRONG_SIGNER_MODE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition { .. } | Self::AlreadySigned(_) => "INVALID_TRANSITION",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the request itself was at fault. Client errors must not be
    /// retried unchanged.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Signing { .. } | Self::Store(_) | Self::Internal(_)
        )
    }

    /// The still-`issued` credential carried by a signing failure.
    pub fn issued_vc(&self) -> Option<&AgentVc> {
        match self {
            Self::Signing { vc, .. } => vc.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn signing(err: VcError, vc: AgentVc) -> Self {
        Self::Signing {
            detail: err.to_string(),
            vc: Some(Box::new(vc)),
        }
    }
}

impl From<StoreError> for LinkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { agent_id, user_id } => {
                Self::DuplicateLink { agent_id, user_id }
            }
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::StatusConflict {
                expected, actual, ..
            } => Self::InvalidTransition {
                from: actual,
                to: expected,
            },
            other => Self::Store(other),
        }
    }
}

impl From<VcError> for LinkError {
    fn from(err: VcError) -> Self {
        match err {
            VcError::Validation(e) => Self::Validation(e),
            VcError::SignerMismatch {
                expected,
                recovered,
            } => Self::SignerMismatch {
                expected,
                recovered,
            },
            VcError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            VcError::AlreadySigned(id) => Self::AlreadySigned(id),
            VcError::Signing(e) => Self::Signing {
                detail: e.to_string(),
                vc: None,
            },
            other @ (VcError::Canonicalization(_) | VcError::Json(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

/// Client-facing error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Machine code plus a message safe to show a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<&LinkError> for ErrorBody {
    fn from(err: &LinkError) -> Self {
        let message = match err {
            LinkError::Signing { .. } => {
                tracing::error!(error = %err, "signing failed");
                "The credential could not be signed; retry the signing step".to_string()
            }
            LinkError::Store(_) | LinkError::Internal(_) => {
                tracing::error!(error = %err, "internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        Self {
            error: ErrorDetail {
                code: err.code().to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlink_crypto::CryptoError;

    fn addr() -> ChainAddress {
        ChainAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap()
    }

    #[test]
    fn duplicate_store_error_becomes_duplicate_link() {
        let err = LinkError::from(StoreError::Duplicate {
            agent_id: addr(),
            user_id: UserId::new("u1").unwrap(),
        });
        assert_eq!(err.code(), "DUPLICATE_LINK");
        assert!(err.is_client_error());
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = LinkError::from(StoreError::Unavailable("connection refused to 10.0.0.7".into()));
        let body = ErrorBody::from(&err);
        assert_eq!(body.error.code, "STORE_ERROR");
        assert!(!body.error.message.contains("10.0.0.7"));
    }

    #[test]
    fn signing_error_hides_provider_detail() {
        let err = LinkError::from(VcError::Signing(CryptoError::ProviderUnavailable(
            "AGENTLINK_SIGNER_KEY not set".into(),
        )));
        assert_eq!(err.code(), "SIGNING_ERROR");
        assert!(!err.is_client_error());
        let body = ErrorBody::from(&err);
        assert!(!body.error.message.contains("AGENTLINK_SIGNER_KEY"));
    }

    #[test]
    fn validation_message_is_shown() {
        let err = LinkError::from(VcError::Validation(ValidationError::EmptyDeclaration));
        let body = ErrorBody::from(&err);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert_eq!(body.error.message, ValidationError::EmptyDeclaration.to_string());
    }

    #[test]
    fn error_body_json_shape() {
        let body = ErrorBody::from(&LinkError::AgentNotFound(addr()));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["error"]["code"], "AGENT_NOT_FOUND");
        assert!(v["error"]["message"].as_str().unwrap().contains("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }
}
