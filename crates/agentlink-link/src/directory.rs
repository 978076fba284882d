//! Agent and user directory collaborators, with in-memory implementations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use agentlink_core::{ChainAddress, IdentityRecord, UserId};
use parking_lot::RwLock;

use crate::error::StoreError;

/// Knows which agents exist.
pub trait AgentDirectory: Send + Sync {
    fn exists(&self, agent_id: &ChainAddress) -> Result<bool, StoreError>;
}

/// Knows each user's identity record.
pub trait UserDirectory: Send + Sync {
    fn identity_record(&self, user_id: &UserId) -> Result<Option<IdentityRecord>, StoreError>;
}

/// In-memory [`AgentDirectory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentDirectory {
    agents: Arc<RwLock<HashSet<ChainAddress>>>,
}

impl InMemoryAgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, agent_id: ChainAddress) {
        self.agents.write().insert(agent_id);
    }
}

impl AgentDirectory for InMemoryAgentDirectory {
    fn exists(&self, agent_id: &ChainAddress) -> Result<bool, StoreError> {
        Ok(self.agents.read().contains(agent_id))
    }
}

/// In-memory [`UserDirectory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    records: Arc<RwLock<HashMap<UserId, IdentityRecord>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's record.
    pub fn upsert(&self, record: IdentityRecord) {
        self.records.write().insert(record.user_id.clone(), record);
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn identity_record(&self, user_id: &UserId) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self.records.read().get(user_id).cloned())
    }
}
