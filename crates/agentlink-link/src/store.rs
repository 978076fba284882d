//! # Credential Store
//!
//! [`VcStore`] is the persistence seam. Implementations must enforce the
//! `(agentId, userId)` uniqueness constraint inside `create` itself; a
//! caller-side check followed by an insert races.
//!
//! [`InMemoryVcStore`] keeps both indexes behind one `parking_lot::RwLock`
//! so the duplicate check and the insert are a single critical section.
//! The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use agentlink_core::{ChainAddress, Timestamp, UserId, VcId};
use agentlink_crypto::RecoverableSignature;
use agentlink_vc::{AgentVc, AnchorRecord, RevocationRecord, VcStatus};
use parking_lot::RwLock;

use crate::error::StoreError;

/// A stored credential and the user it links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVc {
    pub user_id: UserId,
    pub vc: AgentVc,
}

/// Credential persistence.
pub trait VcStore: Send + Sync {
    /// Insert a new credential for `user_id`.
    ///
    /// Fails with [`StoreError::Duplicate`] if a credential already links
    /// `vc.agent_id` and `user_id`.
    fn create(&self, user_id: &UserId, vc: AgentVc) -> Result<(), StoreError>;

    /// The credential linking this agent and user, if any.
    fn find_by_agent_and_user(
        &self,
        agent_id: &ChainAddress,
        user_id: &UserId,
    ) -> Result<Option<AgentVc>, StoreError>;

    /// Look up a credential by id.
    fn get(&self, vc_id: &VcId) -> Result<Option<StoredVc>, StoreError>;

    /// Record a signature and move `issued → signed`.
    ///
    /// Fails with [`StoreError::StatusConflict`] unless the stored record is
    /// `issued`.
    fn update_signature(
        &self,
        vc_id: &VcId,
        signature: RecoverableSignature,
        signer_address: ChainAddress,
        signed_at: Timestamp,
    ) -> Result<AgentVc, StoreError>;

    /// Move a credential from `from` to `to`, attaching the given records.
    ///
    /// Fails with [`StoreError::StatusConflict`] if the stored status is no
    /// longer `from`.
    fn update_status(
        &self,
        vc_id: &VcId,
        from: VcStatus,
        to: VcStatus,
        anchor: Option<AnchorRecord>,
        revocation: Option<RevocationRecord>,
    ) -> Result<AgentVc, StoreError>;

    /// Every credential held by `user_id`, oldest first.
    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<AgentVc>, StoreError>;

    /// Every credential issued for `agent_id`, oldest first.
    fn list_by_agent(&self, agent_id: &ChainAddress) -> Result<Vec<AgentVc>, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<VcId, StoredVc>,
    by_pair: HashMap<(ChainAddress, UserId), VcId>,
}

/// Thread-safe, cloneable in-memory [`VcStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryVcStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryVcStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(
        &self,
        vc_id: &VcId,
        expected: VcStatus,
        f: impl FnOnce(&mut AgentVc),
    ) -> Result<AgentVc, StoreError> {
        let mut guard = self.inner.write();
        let stored = guard
            .by_id
            .get_mut(vc_id)
            .ok_or_else(|| StoreError::NotFound(vc_id.clone()))?;
        if stored.vc.status != expected {
            return Err(StoreError::StatusConflict {
                vc_id: vc_id.clone(),
                expected,
                actual: stored.vc.status,
            });
        }
        f(&mut stored.vc);
        Ok(stored.vc.clone())
    }

    fn sorted(mut vcs: Vec<AgentVc>) -> Vec<AgentVc> {
        vcs.sort_by(|a, b| {
            a.issued_at
                .cmp(&b.issued_at)
                .then_with(|| a.vc_id.cmp(&b.vc_id))
        });
        vcs
    }
}

impl VcStore for InMemoryVcStore {
    fn create(&self, user_id: &UserId, vc: AgentVc) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let pair = (vc.agent_id, user_id.clone());
        if guard.by_pair.contains_key(&pair) {
            return Err(StoreError::Duplicate {
                agent_id: vc.agent_id,
                user_id: user_id.clone(),
            });
        }
        if guard.by_id.contains_key(&vc.vc_id) {
            return Err(StoreError::IdCollision(vc.vc_id));
        }
        guard.by_pair.insert(pair, vc.vc_id.clone());
        guard.by_id.insert(
            vc.vc_id.clone(),
            StoredVc {
                user_id: user_id.clone(),
                vc,
            },
        );
        Ok(())
    }

    fn find_by_agent_and_user(
        &self,
        agent_id: &ChainAddress,
        user_id: &UserId,
    ) -> Result<Option<AgentVc>, StoreError> {
        let guard = self.inner.read();
        Ok(guard
            .by_pair
            .get(&(*agent_id, user_id.clone()))
            .and_then(|id| guard.by_id.get(id))
            .map(|s| s.vc.clone()))
    }

    fn get(&self, vc_id: &VcId) -> Result<Option<StoredVc>, StoreError> {
        Ok(self.inner.read().by_id.get(vc_id).cloned())
    }

    fn update_signature(
        &self,
        vc_id: &VcId,
        signature: RecoverableSignature,
        signer_address: ChainAddress,
        signed_at: Timestamp,
    ) -> Result<AgentVc, StoreError> {
        self.update(vc_id, VcStatus::Issued, |vc| {
            vc.signature = Some(signature);
            vc.signer_address = Some(signer_address);
            vc.signed_at = Some(signed_at);
            vc.status = VcStatus::Signed;
        })
    }

    fn update_status(
        &self,
        vc_id: &VcId,
        from: VcStatus,
        to: VcStatus,
        anchor: Option<AnchorRecord>,
        revocation: Option<RevocationRecord>,
    ) -> Result<AgentVc, StoreError> {
        self.update(vc_id, from, |vc| {
            vc.status = to;
            if anchor.is_some() {
                vc.anchor = anchor;
            }
            if revocation.is_some() {
                vc.revocation = revocation;
            }
        })
    }

    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<AgentVc>, StoreError> {
        let vcs = self
            .inner
            .read()
            .by_id
            .values()
            .filter(|s| &s.user_id == user_id)
            .map(|s| s.vc.clone())
            .collect();
        Ok(Self::sorted(vcs))
    }

    fn list_by_agent(&self, agent_id: &ChainAddress) -> Result<Vec<AgentVc>, StoreError> {
        let vcs = self
            .inner
            .read()
            .by_id
            .values()
            .filter(|s| &s.vc.agent_id == agent_id)
            .map(|s| s.vc.clone())
            .collect();
        Ok(Self::sorted(vcs))
    }
}
