//! # Credential Lifecycle
//!
//! ```text
//! Draft ──▶ Issued ──▶ Signed ──▶ Anchored
//!              │          │          │
//!              └──────────┴──────────┴──▶ Revoked (terminal)
//! ```
//!
//! Every move is a pure function: it takes the credential by value and
//! returns a [`Transition`] holding the new credential plus the store
//! writes ([`StoreEffect`]s) the move implies. Nothing here touches a store;
//! the caller applies the effects, or drops them if a later step fails.
//!
//! Chaining with [`Transition::followed_by`] folds later writes into a
//! pending insert, so "issue then sign" persists a single, fully formed
//! record.

use agentlink_core::{ChainAddress, Timestamp, ValidationError, VcId};
use agentlink_crypto::{recover_message_signer, RecoverableSignature};

use crate::credential::{AgentVc, AnchorRecord, RevocationRecord, VcStatus};
use crate::error::VcError;
use crate::hash::canonical_hash;
use crate::sign::SignatureEnvelope;

/// A store write implied by a lifecycle move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEffect {
    /// Persist a new credential record.
    Insert(Box<AgentVc>),
    /// Record a signature on an `issued` credential and mark it `signed`.
    RecordSignature {
        vc_id: VcId,
        signature: RecoverableSignature,
        signer_address: ChainAddress,
        signed_at: Timestamp,
    },
    /// Move a stored credential between statuses.
    UpdateStatus {
        vc_id: VcId,
        from: VcStatus,
        to: VcStatus,
        anchor: Option<AnchorRecord>,
        revocation: Option<RevocationRecord>,
    },
}

impl StoreEffect {
    /// The credential this write targets.
    pub fn vc_id(&self) -> &VcId {
        match self {
            Self::Insert(vc) => &vc.vc_id,
            Self::RecordSignature { vc_id, .. } | Self::UpdateStatus { vc_id, .. } => vc_id,
        }
    }
}

/// The outcome of a lifecycle move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The credential after the move.
    pub vc: AgentVc,
    /// Writes to apply, in order.
    pub effects: Vec<StoreEffect>,
}

impl Transition {
    /// Compose with a move made on `self.vc`.
    ///
    /// If `self` holds a pending insert of the same credential, the insert is
    /// rewritten to carry `next.vc` and `next`'s writes to that credential
    /// are dropped.
    pub fn followed_by(self, next: Transition) -> Transition {
        let Transition {
            vc,
            effects: next_effects,
        } = next;
        let pending_insert = self
            .effects
            .iter()
            .any(|e| matches!(e, StoreEffect::Insert(v) if v.vc_id == vc.vc_id));

        let effects = if pending_insert {
            self.effects
                .into_iter()
                .map(|e| match e {
                    StoreEffect::Insert(v) if v.vc_id == vc.vc_id => {
                        StoreEffect::Insert(Box::new(vc.clone()))
                    }
                    other => other,
                })
                .chain(next_effects.into_iter().filter(|e| e.vc_id() != &vc.vc_id))
                .collect()
        } else {
            let mut effects = self.effects;
            effects.extend(next_effects);
            effects
        };
        Transition { vc, effects }
    }
}

fn require(vc: &AgentVc, to: VcStatus) -> Result<(), VcError> {
    if vc.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(VcError::InvalidTransition {
            from: vc.status,
            to,
        })
    }
}

/// Accept a draft (`Draft → Issued`). Emits the insert of the issued record.
pub fn issue(mut vc: AgentVc) -> Result<Transition, VcError> {
    require(&vc, VcStatus::Issued)?;
    vc.status = VcStatus::Issued;
    Ok(Transition {
        effects: vec![StoreEffect::Insert(Box::new(vc.clone()))],
        vc,
    })
}

/// Attach a signature (`Issued → Signed`).
///
/// The signature is checked against the credential's own hash: it must
/// recover to `envelope.signer_address`, and to `expected_signer` when one
/// is given (the holder's wallet in holder-signing mode).
pub fn attach_signature(
    mut vc: AgentVc,
    envelope: SignatureEnvelope,
    expected_signer: Option<&ChainAddress>,
) -> Result<Transition, VcError> {
    if vc.is_signed() {
        return Err(VcError::AlreadySigned(vc.vc_id));
    }
    require(&vc, VcStatus::Signed)?;

    let hash = canonical_hash(&vc)?;
    let recovered = recover_message_signer(&hash.bytes, &envelope.signature)
        .map_err(|e| ValidationError::InvalidSignature(e.to_string()))?;
    if recovered != envelope.signer_address {
        return Err(VcError::SignerMismatch {
            expected: envelope.signer_address,
            recovered,
        });
    }
    if let Some(expected) = expected_signer {
        if recovered != *expected {
            return Err(VcError::SignerMismatch {
                expected: *expected,
                recovered,
            });
        }
    }

    vc.signature = Some(envelope.signature);
    vc.signer_address = Some(envelope.signer_address);
    vc.signed_at = Some(envelope.signed_at);
    vc.status = VcStatus::Signed;
    Ok(Transition {
        effects: vec![StoreEffect::RecordSignature {
            vc_id: vc.vc_id.clone(),
            signature: envelope.signature,
            signer_address: envelope.signer_address,
            signed_at: envelope.signed_at,
        }],
        vc,
    })
}

/// Record externally supplied anchoring metadata (`Signed → Anchored`).
pub fn anchor(mut vc: AgentVc, record: AnchorRecord) -> Result<Transition, VcError> {
    require(&vc, VcStatus::Anchored)?;
    if record.transaction_hash.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("transactionHash").into());
    }
    let from = vc.status;
    vc.status = VcStatus::Anchored;
    vc.anchor = Some(record.clone());
    Ok(Transition {
        effects: vec![StoreEffect::UpdateStatus {
            vc_id: vc.vc_id.clone(),
            from,
            to: VcStatus::Anchored,
            anchor: Some(record),
            revocation: None,
        }],
        vc,
    })
}

/// Withdraw a credential (`Issued | Signed | Anchored → Revoked`).
pub fn revoke(mut vc: AgentVc, reason: &str, now: Timestamp) -> Result<Transition, VcError> {
    require(&vc, VcStatus::Revoked)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::EmptyIdentifier("reason").into());
    }
    let record = RevocationRecord {
        reason: reason.to_string(),
        revoked_at: now,
    };
    let from = vc.status;
    vc.status = VcStatus::Revoked;
    vc.revocation = Some(record.clone());
    Ok(Transition {
        effects: vec![StoreEffect::UpdateStatus {
            vc_id: vc.vc_id.clone(),
            from,
            to: VcStatus::Revoked,
            anchor: None,
            revocation: Some(record),
        }],
        vc,
    })
}
