//! # Credential Assembly
//!
//! Builds a `draft` credential from an agent address, the human's stored
//! identity record and their declaration. Pure apart from the random part
//! of the credential id.

use agentlink_core::{ChainAddress, IdentityRecord, Timestamp, ValidationError, VcId};

use crate::credential::{AgentVc, Declaration, HumanProof, IssuerProfile, VcStatus};
use crate::error::VcError;

/// Inputs to [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    /// Agent wallet address as supplied by the caller.
    pub agent_id: String,
    /// The linking user's stored identity state.
    pub identity: IdentityRecord,
    /// Free-text declaration.
    pub declaration: String,
}

/// Build a `draft` credential.
///
/// # Errors
///
/// `VcError::Validation` when the agent address is malformed or fails its
/// checksum, the declaration is blank, or the identity record has no
/// verified proof. Callers reject the request; retrying cannot help.
pub fn assemble(
    request: AssembleRequest,
    issuer: &IssuerProfile,
    now: Timestamp,
) -> Result<AgentVc, VcError> {
    let agent_id = ChainAddress::parse(request.agent_id.trim())?;

    let description = request.declaration.trim();
    if description.is_empty() {
        return Err(ValidationError::EmptyDeclaration.into());
    }

    let human_proof = HumanProof::from_identity(&request.identity)?;

    Ok(AgentVc {
        vc_id: VcId::generate(),
        version: issuer.version.clone(),
        credential_type: issuer.credential_types.clone(),
        issuer: issuer.issuer.clone(),
        credential_schema: issuer.credential_schema.clone(),
        issued_at: now,
        agent_id,
        human_proof,
        declaration: Declaration {
            description: description.to_string(),
            created_at: now,
        },
        status: VcStatus::Draft,
        signature: None,
        signer_address: None,
        signed_at: None,
        anchor: None,
        revocation: None,
    })
}
