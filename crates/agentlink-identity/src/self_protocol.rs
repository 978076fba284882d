//! # Self Protocol Backend Verifier Client
//!
//! Posts a Self passport / ID-card proof to a Self backend verifier's
//! `/api/verify` endpoint.

use agentlink_core::{AttestationId, Nullifier, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::http::{join, post_json};

/// A proof as produced by the Self mobile app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfSubmission {
    pub attestation_id: AttestationId,
    pub proof: serde_json::Value,
    pub public_signals: Vec<String>,
    pub user_context_data: String,
}

/// A proof the verifier accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfVerified {
    pub nullifier: Nullifier,
    pub attestation_id: AttestationId,
    pub verified_at: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    #[serde(default)]
    is_valid: bool,
    #[serde(alias = "nullifierHash")]
    nullifier: Option<String>,
    attestation_id: Option<AttestationId>,
    /// Unix milliseconds.
    timestamp: Option<i64>,
    #[serde(alias = "message")]
    error: Option<String>,
}

/// HTTP client for a Self backend verifier.
#[derive(Clone)]
pub struct SelfClient {
    http: reqwest::Client,
    verify_url: String,
    api_key: Option<zeroize::Zeroizing<String>>,
}

impl std::fmt::Debug for SelfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfClient")
            .field("verify_url", &self.verify_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SelfClient {
    /// Build a client from configuration.
    pub fn new(http: reqwest::Client, config: &VerifierConfig) -> Self {
        Self {
            http,
            verify_url: join(&config.self_verifier_url, "api/verify"),
            api_key: config.self_api_key.clone(),
        }
    }

    /// Verify one proof. Not retried on failure.
    pub async fn verify(&self, submission: &SelfSubmission) -> Result<SelfVerified, VerifierError> {
        let endpoint = "POST /api/verify";
        let resp: VerifyResponse = post_json(
            &self.http,
            &self.verify_url,
            endpoint,
            self.api_key.as_ref().map(|k| k.as_str()),
            submission,
        )
        .await?;

        if !resp.is_valid {
            return Err(VerifierError::Rejected {
                endpoint: endpoint.to_string(),
                status: 200,
                code: "invalid_proof".to_string(),
                detail: resp
                    .error
                    .unwrap_or_else(|| "verifier reported an invalid proof".to_string()),
            });
        }

        let deser = |detail: String| VerifierError::Deserialization {
            endpoint: endpoint.to_string(),
            detail,
        };
        let nullifier = resp
            .nullifier
            .ok_or_else(|| deser("valid response carries no nullifier".to_string()))
            .and_then(|raw| Nullifier::new(raw).map_err(|e| deser(e.to_string())))?;
        let verified_at = match resp.timestamp {
            Some(ms) => Timestamp::from_epoch_millis(ms).map_err(|e| deser(e.to_string()))?,
            None => Timestamp::now(),
        };
        let attestation_id = resp.attestation_id.unwrap_or(submission.attestation_id);

        tracing::debug!(
            nullifier = %nullifier,
            attestation_id = %attestation_id,
            "Self proof verified"
        );

        Ok(SelfVerified {
            nullifier,
            attestation_id,
            verified_at,
        })
    }
}
