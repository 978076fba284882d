//! # World ID Cloud Verifier Client
//!
//! Posts a World ID zero-knowledge proof to the developer portal's
//! `/api/v2/verify/{app_id}` endpoint. The portal checks the proof against
//! the on-chain Merkle root and tracks nullifier use per action.

use agentlink_core::{Nullifier, Timestamp, VerificationLevel};
use serde::{Deserialize, Serialize};

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::http::{join, post_json};

/// A World ID proof as produced by IDKit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldIdSubmission {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_hash: Option<String>,
}

/// A proof the portal accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldIdVerified {
    pub nullifier_hash: Nullifier,
    pub verification_level: VerificationLevel,
    pub verified_at: Timestamp,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(flatten)]
    submission: &'a WorldIdSubmission,
    action: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    nullifier_hash: Option<String>,
    code: Option<String>,
    detail: Option<String>,
}

/// HTTP client for the World ID developer portal.
#[derive(Debug, Clone)]
pub struct WorldIdClient {
    http: reqwest::Client,
    verify_url: String,
    action: String,
}

impl WorldIdClient {
    /// Build a client from configuration.
    pub fn new(http: reqwest::Client, config: &VerifierConfig) -> Self {
        Self {
            http,
            verify_url: join(
                &config.world_id_base_url,
                &format!("api/v2/verify/{}", config.world_id_app_id),
            ),
            action: config.world_id_action.clone(),
        }
    }

    /// Verify one proof. Not retried on failure.
    pub async fn verify(
        &self,
        submission: &WorldIdSubmission,
    ) -> Result<WorldIdVerified, VerifierError> {
        let endpoint = "POST /api/v2/verify";
        let body = VerifyRequest {
            submission,
            action: &self.action,
        };
        let resp: VerifyResponse =
            post_json(&self.http, &self.verify_url, endpoint, None, &body).await?;

        if !resp.success {
            return Err(VerifierError::Rejected {
                endpoint: endpoint.to_string(),
                status: 200,
                code: resp.code.unwrap_or_else(|| "verification_failed".to_string()),
                detail: resp
                    .detail
                    .unwrap_or_else(|| "verifier reported failure".to_string()),
            });
        }

        let raw = resp
            .nullifier_hash
            .unwrap_or_else(|| submission.nullifier_hash.clone());
        let nullifier_hash =
            Nullifier::new(raw).map_err(|e| VerifierError::Deserialization {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;

        tracing::debug!(
            nullifier = %nullifier_hash,
            level = %submission.verification_level,
            "World ID proof verified"
        );

        Ok(WorldIdVerified {
            nullifier_hash,
            verification_level: submission.verification_level,
            verified_at: Timestamp::now(),
        })
    }
}
