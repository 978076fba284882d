//! # Link Service
//!
//! Links an agent wallet to a verified human.
//!
//! ```text
//! NoLink ──link──▶ Linking ──persist──▶ Linked
//!                  assemble → issue → sign (platform mode)
//! ```
//!
//! In platform mode the credential is persisted once, already signed. A
//! signing failure persists nothing and hands back the `issued`
//! credential; [`LinkService::complete`] retries from there.
//!
//! In holder mode the `issued` credential is persisted and its hash is the
//! signing target for the user's wallet.
//! [`LinkService::attach_holder_signature`] checks the wallet signature and
//! records it.
//!
//! All state changes go through the pure transitions in
//! [`agentlink_vc::lifecycle`]; this module only applies their effects.

use std::sync::Arc;

use agentlink_core::{ChainAddress, ContentDigest, IdentityRecord, Timestamp, UserId, VcId};
use agentlink_crypto::{KeyProvider, RecoverableSignature};
use agentlink_vc::lifecycle::{self, StoreEffect, Transition};
use agentlink_vc::{
    assemble, canonical_hash, sign_vc, verify_vc, AgentVc, AnchorRecord, AssembleRequest,
    HumanProof, SignatureEnvelope, SignedArtifact, VcStatus, VerificationOutcome,
};
use tracing::{debug, info, warn};

use crate::config::{LinkConfig, SignerMode};
use crate::directory::{AgentDirectory, UserDirectory};
use crate::error::LinkError;
use crate::store::{StoredVc, VcStore};

/// A request to link an agent to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Agent wallet address as supplied by the caller.
    pub agent_id: String,
    pub user_id: UserId,
    pub declaration: String,
}

/// What a successful `link` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Platform mode: the credential is signed and stored.
    Signed(SignedArtifact),
    /// Holder mode: the credential is stored as `issued`; the user's wallet
    /// must sign `hash`.
    AwaitingHolderSignature { vc: AgentVc, hash: ContentDigest },
}

impl LinkOutcome {
    /// The credential in either case.
    pub fn vc(&self) -> &AgentVc {
        match self {
            Self::Signed(artifact) => &artifact.vc,
            Self::AwaitingHolderSignature { vc, .. } => vc,
        }
    }
}

/// Agent-link orchestration over the store and directory collaborators.
pub struct LinkService {
    config: LinkConfig,
    store: Arc<dyn VcStore>,
    agents: Arc<dyn AgentDirectory>,
    users: Arc<dyn UserDirectory>,
    signer: Arc<dyn KeyProvider>,
}

impl std::fmt::Debug for LinkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkService")
            .field("config", &self.config)
            .field("signer", &self.signer.provider_name())
            .finish_non_exhaustive()
    }
}

impl LinkService {
    pub fn new(
        config: LinkConfig,
        store: Arc<dyn VcStore>,
        agents: Arc<dyn AgentDirectory>,
        users: Arc<dyn UserDirectory>,
        signer: Arc<dyn KeyProvider>,
    ) -> Self {
        Self {
            config,
            store,
            agents,
            users,
            signer,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Link `request.agent_id` to `request.user_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed address, empty declaration or a user
    ///   without a verified proof.
    /// - `AgentNotFound` / `UserNotFound` from the directories.
    /// - `DuplicateLink` if the pair is already linked, including when a
    ///   concurrent request wins the insert.
    /// - `Signing` if the platform signer fails. Nothing is stored.
    pub fn link(&self, request: LinkRequest) -> Result<LinkOutcome, LinkError> {
        let agent_input = request.agent_id.trim().to_string();
        let agent_id = ChainAddress::parse(&agent_input)?;
        if !self.agents.exists(&agent_id)? {
            return Err(LinkError::AgentNotFound(agent_id));
        }
        let identity = self.identity(&request.user_id)?;
        self.ensure_unlinked(&agent_id, &request.user_id)?;

        let holder_wallet = match self.config.signer.mode {
            SignerMode::Holder => Some(Self::wallet(&identity)?),
            SignerMode::Platform => None,
        };

        let draft = assemble(
            AssembleRequest {
                agent_id: agent_input,
                identity,
                declaration: request.declaration,
            },
            &self.config.issuer_profile(),
            Timestamp::now(),
        )?;
        let issued = lifecycle::issue(draft)?;

        match holder_wallet {
            None => {
                let artifact = self.sign_and_persist(&request.user_id, issued)?;
                Ok(LinkOutcome::Signed(artifact))
            }
            Some(wallet) => {
                let hash = canonical_hash(&issued.vc)?;
                let vc = issued.vc.clone();
                self.apply(&request.user_id, issued.effects)?;
                info!(
                    vc_id = %vc.vc_id,
                    agent_id = %agent_id,
                    user_id = %request.user_id,
                    holder = %wallet,
                    "Link issued, awaiting holder signature"
                );
                Ok(LinkOutcome::AwaitingHolderSignature { vc, hash })
            }
        }
    }

    /// Retry the sign-and-persist step for a credential returned by a
    /// failed platform-mode `link`.
    ///
    /// The credential is re-checked against the directories and the user's
    /// current identity record before the platform key signs it: the agent
    /// must exist, the user must exist, and the human proof and issuer
    /// metadata must be exactly what `link` would have assembled.
    pub fn complete(&self, user_id: &UserId, issued: AgentVc) -> Result<SignedArtifact, LinkError> {
        self.require_mode(SignerMode::Platform)?;
        if issued.status != VcStatus::Issued {
            return Err(LinkError::InvalidTransition {
                from: issued.status,
                to: VcStatus::Signed,
            });
        }
        if !self.agents.exists(&issued.agent_id)? {
            return Err(LinkError::AgentNotFound(issued.agent_id));
        }
        let identity = self.identity(user_id)?;
        self.check_retry(&issued, &identity)?;
        self.ensure_unlinked(&issued.agent_id, user_id)?;
        let pending = Transition {
            effects: vec![StoreEffect::Insert(Box::new(issued.clone()))],
            vc: issued,
        };
        self.sign_and_persist(user_id, pending)
    }

    /// Platform-sign a stored `issued` credential.
    pub fn sign_pending(&self, vc_id: &VcId) -> Result<SignedArtifact, LinkError> {
        self.require_mode(SignerMode::Platform)?;
        let stored = self.stored(vc_id)?;
        let signed = self.platform_sign(&stored.vc)?;
        let vc = self.apply(&stored.user_id, signed.effects)?;
        info!(vc_id = %vc_id, "Pending credential signed");
        Ok(SignedArtifact::from_vc(vc)?)
    }

    /// Record the holder's wallet signature over a stored `issued`
    /// credential. The signature must recover to the wallet address on the
    /// user's identity record.
    pub fn attach_holder_signature(
        &self,
        vc_id: &VcId,
        signature: RecoverableSignature,
    ) -> Result<SignedArtifact, LinkError> {
        self.require_mode(SignerMode::Holder)?;
        let stored = self.stored(vc_id)?;
        let identity = self.identity(&stored.user_id)?;
        let wallet = Self::wallet(&identity)?;

        let envelope = SignatureEnvelope {
            hash: canonical_hash(&stored.vc)?,
            signature,
            signer_address: wallet,
            signed_at: Timestamp::now(),
        };
        let signed = lifecycle::attach_signature(stored.vc, envelope, Some(&wallet))
            .map_err(|e| {
                warn!(vc_id = %vc_id, error = %e, "Holder signature rejected");
                LinkError::from(e)
            })?;
        let vc = self.apply(&stored.user_id, signed.effects)?;
        info!(vc_id = %vc_id, signer = %wallet, "Holder signature attached");
        Ok(SignedArtifact::from_vc(vc)?)
    }

    /// Record external anchoring metadata (`signed → anchored`).
    pub fn anchor(
        &self,
        vc_id: &VcId,
        transaction_hash: &str,
        chain_id: u64,
    ) -> Result<AgentVc, LinkError> {
        let stored = self.stored(vc_id)?;
        let t = lifecycle::anchor(
            stored.vc,
            AnchorRecord {
                transaction_hash: transaction_hash.trim().to_string(),
                chain_id,
                anchored_at: Timestamp::now(),
            },
        )?;
        let vc = self.apply(&stored.user_id, t.effects)?;
        info!(vc_id = %vc_id, chain_id, "Credential anchored");
        Ok(vc)
    }

    /// Withdraw a credential.
    pub fn revoke(&self, vc_id: &VcId, reason: &str) -> Result<AgentVc, LinkError> {
        let stored = self.stored(vc_id)?;
        let t = lifecycle::revoke(stored.vc, reason, Timestamp::now())?;
        let vc = self.apply(&stored.user_id, t.effects)?;
        info!(vc_id = %vc_id, "Credential revoked");
        Ok(vc)
    }

    /// Verify a stored credential.
    pub fn verify_stored(&self, vc_id: &VcId) -> Result<VerificationOutcome, LinkError> {
        let stored = self.stored(vc_id)?;
        let outcome = verify_vc(&stored.vc);
        debug!(vc_id = %vc_id, valid = outcome.is_valid(), "Stored credential verified");
        Ok(outcome)
    }

    pub fn get(&self, vc_id: &VcId) -> Result<AgentVc, LinkError> {
        Ok(self.stored(vc_id)?.vc)
    }

    pub fn list_by_user(&self, user_id: &UserId) -> Result<Vec<AgentVc>, LinkError> {
        Ok(self.store.list_by_user(user_id)?)
    }

    pub fn list_by_agent(&self, agent_id: &ChainAddress) -> Result<Vec<AgentVc>, LinkError> {
        Ok(self.store.list_by_agent(agent_id)?)
    }

    // ── internals ────────────────────────────────────────────────────

    fn identity(&self, user_id: &UserId) -> Result<IdentityRecord, LinkError> {
        self.users
            .identity_record(user_id)?
            .ok_or_else(|| LinkError::UserNotFound(user_id.clone()))
    }

    /// A retried credential must match what `link` assembles for this user.
    fn check_retry(&self, issued: &AgentVc, identity: &IdentityRecord) -> Result<(), LinkError> {
        let mismatch = |field: &'static str| {
            warn!(
                vc_id = %issued.vc_id,
                user_id = %identity.user_id,
                field,
                "Retried credential does not match the user's record"
            );
            Err(LinkError::CredentialMismatch {
                vc_id: issued.vc_id.clone(),
                field,
            })
        };

        if issued.human_proof != HumanProof::from_identity(identity)? {
            return mismatch("humanProof");
        }
        let profile = self.config.issuer_profile();
        if issued.issuer != profile.issuer {
            return mismatch("issuer");
        }
        if issued.credential_schema != profile.credential_schema {
            return mismatch("credentialSchema");
        }
        if issued.version != profile.version {
            return mismatch("version");
        }
        if issued.credential_type != profile.credential_types {
            return mismatch("type");
        }
        if issued.declaration.description.trim().is_empty()
            || issued.declaration.description.trim() != issued.declaration.description
        {
            return mismatch("declaration");
        }
        if issued.is_signed() || issued.signer_address.is_some() || issued.signed_at.is_some() {
            return mismatch("signature");
        }
        if issued.anchor.is_some() || issued.revocation.is_some() {
            return mismatch("status");
        }
        Ok(())
    }

    fn wallet(identity: &IdentityRecord) -> Result<ChainAddress, LinkError> {
        identity
            .wallet_address
            .ok_or_else(|| LinkError::HolderWalletMissing(identity.user_id.clone()))
    }

    fn stored(&self, vc_id: &VcId) -> Result<StoredVc, LinkError> {
        self.store
            .get(vc_id)?
            .ok_or_else(|| LinkError::NotFound(vc_id.clone()))
    }

    fn require_mode(&self, mode: SignerMode) -> Result<(), LinkError> {
        if self.config.signer.mode == mode {
            Ok(())
        } else {
            Err(LinkError::WrongSignerMode(mode))
        }
    }

    /// Fast rejection for the common case. The store's own constraint is
    /// what makes the pair unique.
    fn ensure_unlinked(&self, agent_id: &ChainAddress, user_id: &UserId) -> Result<(), LinkError> {
        if let Some(existing) = self.store.find_by_agent_and_user(agent_id, user_id)? {
            info!(
                agent_id = %agent_id,
                user_id = %user_id,
                existing = %existing.vc_id,
                "Link rejected: pair already linked"
            );
            return Err(LinkError::DuplicateLink {
                agent_id: *agent_id,
                user_id: user_id.clone(),
            });
        }
        Ok(())
    }

    fn platform_sign(&self, vc: &AgentVc) -> Result<Transition, LinkError> {
        let envelope = sign_vc(vc, self.signer.as_ref(), Timestamp::now()).map_err(|e| {
            warn!(
                vc_id = %vc.vc_id,
                provider = self.signer.provider_name(),
                error = %e,
                "Platform signing failed"
            );
            LinkError::signing(e, vc.clone())
        })?;
        Ok(lifecycle::attach_signature(vc.clone(), envelope, None)?)
    }

    fn sign_and_persist(
        &self,
        user_id: &UserId,
        pending: Transition,
    ) -> Result<SignedArtifact, LinkError> {
        let signed = self.platform_sign(&pending.vc)?;
        let t = pending.followed_by(signed);
        let vc = self.apply(user_id, t.effects)?;
        info!(
            vc_id = %vc.vc_id,
            agent_id = %vc.agent_id,
            user_id = %user_id,
            "Link created"
        );
        Ok(SignedArtifact::from_vc(vc)?)
    }

    /// Apply effects in order and return the final stored state of the
    /// credential they target.
    fn apply(&self, user_id: &UserId, effects: Vec<StoreEffect>) -> Result<AgentVc, LinkError> {
        let mut last = None;
        for effect in effects {
            let vc = match effect {
                StoreEffect::Insert(vc) => {
                    let vc = *vc;
                    self.store.create(user_id, vc.clone())?;
                    vc
                }
                StoreEffect::RecordSignature {
                    vc_id,
                    signature,
                    signer_address,
                    signed_at,
                } => self
                    .store
                    .update_signature(&vc_id, signature, signer_address, signed_at)?,
                StoreEffect::UpdateStatus {
                    vc_id,
                    from,
                    to,
                    anchor,
                    revocation,
                } => self
                    .store
                    .update_status(&vc_id, from, to, anchor, revocation)?,
            };
            last = Some(vc);
        }
        last.ok_or_else(|| LinkError::Internal("transition produced no store writes".to_string()))
    }
}
