//! # agentlink-identity — Identity Verifier Collaborators
//!
//! HTTP clients for the two upstream human-identity verifiers, plus the
//! state that sits in front of them:
//!
//! - [`WorldIdClient`]: World ID developer portal.
//! - [`SelfClient`]: Self Protocol backend verifier.
//! - [`VerificationCache`]: TTL and capacity bounded memo of successes.
//! - [`NullifierRegistry`]: one user per nullifier.
//! - [`IdentityService`]: ties them together and produces
//!   [`IdentityRecord`](agentlink_core::IdentityRecord) updates.
//!
//! Verifier calls are never retried automatically.

pub mod cache;
pub mod config;
pub mod error;
mod http;
pub mod self_protocol;
pub mod service;
pub mod world_id;

pub use cache::{spawn_sweeper, CacheStats, VerificationCache};
pub use config::{ConfigError, VerifierConfig};
pub use error::VerifierError;
pub use self_protocol::{SelfClient, SelfSubmission, SelfVerified};
pub use service::{IdentityService, NullifierRegistry, NullifierScope};
pub use world_id::{WorldIdClient, WorldIdSubmission, WorldIdVerified};
