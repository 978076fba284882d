//! # Identity Service
//!
//! Turns a verifier submission into a verified entry on the user's
//! [`IdentityRecord`]:
//!
//! 1. Look the submission up in the verification cache, keyed by the
//!    SHA-256 of its canonical bytes.
//! 2. On a miss, call the verifier and cache the success.
//! 3. Bind the returned nullifier to the user. A nullifier already bound
//!    to someone else is rejected.
//! 4. Write the verification onto the record, keeping the raw submission.
//!
//! The cache lets a client re-submit the same proof after a downstream
//! failure without the verifier refusing it as a replay.

use std::sync::Arc;
use std::time::Duration;

use agentlink_core::{
    sha256_digest, CanonicalBytes, IdentityRecord, Nullifier, SelfIdVerification, UserId,
    WorldIdVerification,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::cache::{spawn_sweeper, VerificationCache};
use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::self_protocol::{SelfClient, SelfSubmission, SelfVerified};
use crate::world_id::{WorldIdClient, WorldIdSubmission, WorldIdVerified};

/// Which verifier issued a nullifier. Nullifiers from different verifiers
/// live in separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullifierScope {
    WorldId,
    SelfId,
}

/// Binds each nullifier to the first user that presented it.
#[derive(Debug, Default)]
pub struct NullifierRegistry {
    bindings: DashMap<(NullifierScope, Nullifier), UserId>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `nullifier` to `user`. Re-binding to the same user is a no-op.
    pub fn bind(
        &self,
        scope: NullifierScope,
        nullifier: &Nullifier,
        user: &UserId,
    ) -> Result<(), VerifierError> {
        match self.bindings.entry((scope, nullifier.clone())) {
            Entry::Occupied(existing) if existing.get() != user => {
                tracing::warn!(
                    nullifier = %nullifier,
                    ?scope,
                    "Nullifier presented by a second user"
                );
                Err(VerifierError::NullifierReused {
                    nullifier: nullifier.clone(),
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    /// The user a nullifier is bound to, if any.
    pub fn owner(&self, scope: NullifierScope, nullifier: &Nullifier) -> Option<UserId> {
        self.bindings
            .get(&(scope, nullifier.clone()))
            .map(|u| u.value().clone())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Verifier clients, their caches and the nullifier registry.
#[derive(Debug)]
pub struct IdentityService {
    world_id: WorldIdClient,
    self_id: SelfClient,
    world_cache: Arc<VerificationCache<WorldIdVerified>>,
    self_cache: Arc<VerificationCache<SelfVerified>>,
    nullifiers: NullifierRegistry,
}

impl IdentityService {
    /// Build the service and its HTTP client from configuration.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, VerifierError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VerifierError::Unreachable {
                endpoint: "client".to_string(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_http(http, config))
    }

    /// Build the service around an existing HTTP client.
    pub fn with_http(http: reqwest::Client, config: &VerifierConfig) -> Self {
        Self {
            world_id: WorldIdClient::new(http.clone(), config),
            self_id: SelfClient::new(http, config),
            world_cache: Arc::new(VerificationCache::new(
                config.cache_ttl(),
                config.cache_capacity,
            )),
            self_cache: Arc::new(VerificationCache::new(
                config.cache_ttl(),
                config.cache_capacity,
            )),
            nullifiers: NullifierRegistry::new(),
        }
    }

    /// Start background sweepers for both caches.
    pub fn spawn_sweepers(&self, interval: Duration) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            spawn_sweeper(self.world_cache.clone(), interval),
            spawn_sweeper(self.self_cache.clone(), interval),
        ]
    }

    pub fn nullifiers(&self) -> &NullifierRegistry {
        &self.nullifiers
    }

    /// Verify a World ID proof and record it on `record`.
    pub async fn apply_world_id(
        &self,
        mut record: IdentityRecord,
        submission: &WorldIdSubmission,
    ) -> Result<IdentityRecord, VerifierError> {
        let key = cache_key(submission)?;
        let raw_proof = recorded_proof(submission)?;
        let verified = match self.world_cache.get(&key) {
            Some(v) => v,
            None => {
                let v = self.world_id.verify(submission).await.map_err(|e| {
                    tracing::warn!(user_id = %record.user_id, error = %e, "World ID verification failed");
                    e
                })?;
                self.world_cache.insert(key, v.clone());
                v
            }
        };

        self.nullifiers.bind(
            NullifierScope::WorldId,
            &verified.nullifier_hash,
            &record.user_id,
        )?;

        record.world_id_verification = Some(WorldIdVerification {
            is_verified: true,
            nullifier_hash: verified.nullifier_hash,
            verification_level: verified.verification_level,
            verified_at: verified.verified_at,
            raw_proof: Some(raw_proof),
        });
        tracing::info!(user_id = %record.user_id, "World ID verification recorded");
        Ok(record)
    }

    /// Verify a Self proof and record it on `record`.
    pub async fn apply_self_id(
        &self,
        mut record: IdentityRecord,
        submission: &SelfSubmission,
    ) -> Result<IdentityRecord, VerifierError> {
        let key = cache_key(submission)?;
        let raw_proof = recorded_proof(submission)?;
        let verified = match self.self_cache.get(&key) {
            Some(v) => v,
            None => {
                let v = self.self_id.verify(submission).await.map_err(|e| {
                    tracing::warn!(user_id = %record.user_id, error = %e, "Self verification failed");
                    e
                })?;
                self.self_cache.insert(key, v.clone());
                v
            }
        };

        self.nullifiers
            .bind(NullifierScope::SelfId, &verified.nullifier, &record.user_id)?;

        record.self_id_verification = Some(SelfIdVerification {
            is_verified: true,
            attestation_id: verified.attestation_id,
            nullifier: verified.nullifier,
            verified_at: verified.verified_at,
            raw_proof: Some(raw_proof),
        });
        tracing::info!(user_id = %record.user_id, "Self verification recorded");
        Ok(record)
    }
}

/// The submission as stored on the identity record.
fn recorded_proof(submission: &impl Serialize) -> Result<serde_json::Value, VerifierError> {
    serde_json::to_value(submission).map_err(|e| {
        tracing::warn!(error = %e, "Proof submission could not be recorded");
        VerifierError::InvalidSubmission(format!("proof submission is not JSON: {e}"))
    })
}

fn cache_key(submission: &impl Serialize) -> Result<String, VerifierError> {
    let canonical = CanonicalBytes::new(submission)
        .map_err(|e| VerifierError::InvalidSubmission(e.to_string()))?;
    Ok(sha256_digest(&canonical).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlink_core::{AttestationId, VerificationLevel};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn nullifier_binds_to_first_user() {
        let reg = NullifierRegistry::new();
        let n = Nullifier::new("0xAbC").unwrap();
        reg.bind(NullifierScope::WorldId, &n, &user("alice")).unwrap();
        reg.bind(NullifierScope::WorldId, &n, &user("alice")).unwrap();
        let err = reg
            .bind(NullifierScope::WorldId, &Nullifier::new("0xabc").unwrap(), &user("bob"))
            .unwrap_err();
        assert!(matches!(err, VerifierError::NullifierReused { .. }));
        assert_eq!(reg.owner(NullifierScope::WorldId, &n), Some(user("alice")));
    }

    #[test]
    fn nullifier_scopes_are_independent() {
        let reg = NullifierRegistry::new();
        let n = Nullifier::new("12345").unwrap();
        reg.bind(NullifierScope::WorldId, &n, &user("alice")).unwrap();
        reg.bind(NullifierScope::SelfId, &n, &user("bob")).unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn cache_key_ignores_field_order() {
        let a = WorldIdSubmission {
            merkle_root: "0x1".into(),
            nullifier_hash: "0x2".into(),
            proof: "0x3".into(),
            verification_level: VerificationLevel::Device,
            signal_hash: None,
        };
        let reordered: WorldIdSubmission = serde_json::from_value(serde_json::json!({
            "verification_level": "device",
            "proof": "0x3",
            "nullifier_hash": "0x2",
            "merkle_root": "0x1"
        }))
        .unwrap();
        assert_eq!(cache_key(&a).unwrap(), cache_key(&reordered).unwrap());
        assert_eq!(cache_key(&a).unwrap().len(), 64);
    }

    #[test]
    fn cache_key_rejects_float_payloads() {
        let s = SelfSubmission {
            attestation_id: AttestationId(1),
            proof: serde_json::json!({"pi_a": [1.5]}),
            public_signals: vec![],
            user_context_data: String::new(),
        };
        assert!(matches!(
            cache_key(&s),
            Err(VerifierError::InvalidSubmission(_))
        ));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn recorded_proof_surfaces_serialization_failure() {
        assert!(matches!(
            recorded_proof(&Unserializable),
            Err(VerifierError::InvalidSubmission(msg)) if msg.contains("not representable")
        ));
    }

    #[test]
    fn recorded_proof_is_the_submission() {
        let s = WorldIdSubmission {
            merkle_root: "0x1".into(),
            nullifier_hash: "0x2".into(),
            proof: "0x3".into(),
            verification_level: VerificationLevel::Orb,
            signal_hash: None,
        };
        let recorded = recorded_proof(&s).unwrap();
        assert_eq!(recorded["merkle_root"], "0x1");
        assert_eq!(recorded["verification_level"], "orb");
    }
}
