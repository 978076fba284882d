//! # agentlink-link — Agent-Link Orchestration
//!
//! Binds an agent wallet to a verified human through a signed credential.
//!
//! - [`LinkService`]: link, complete, holder signatures, anchoring,
//!   revocation and verification of stored credentials.
//! - [`VcStore`], [`AgentDirectory`], [`UserDirectory`]: collaborator
//!   seams, with in-memory implementations.
//! - [`LinkConfig`]: YAML configuration, including who signs.
//!
//! ## Invariants
//!
//! - At most one credential per `(agentId, userId)` pair, enforced by the
//!   store's insert.
//! - A failed link leaves nothing in the store.

pub mod config;
pub mod directory;
pub mod error;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, LinkConfig, SignerConfig, SignerMode, DEFAULT_SIGNER_KEY_ENV};
pub use directory::{AgentDirectory, InMemoryAgentDirectory, InMemoryUserDirectory, UserDirectory};
pub use error::{ErrorBody, ErrorDetail, LinkError, StoreError};
pub use service::{LinkOutcome, LinkRequest, LinkService};
pub use store::{InMemoryVcStore, StoredVc, VcStore};
