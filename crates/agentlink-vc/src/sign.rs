//! # Credential Signing
//!
//! The signer is handed the credential hash and signs its 32 raw bytes as an
//! EIP-191 personal message, the same thing a wallet's `personal_sign` does
//! when given the hash. Signing never mutates the credential; the result is
//! attached through [`crate::lifecycle::attach_signature`].

use agentlink_core::{ChainAddress, ContentDigest, Timestamp};
use agentlink_crypto::{KeyProvider, RecoverableSignature};

use crate::credential::AgentVc;
use crate::error::VcError;
use crate::hash::canonical_hash;

/// A signature over a credential hash, ready to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    /// The hash that was signed.
    pub hash: ContentDigest,
    pub signature: RecoverableSignature,
    pub signer_address: ChainAddress,
    pub signed_at: Timestamp,
}

/// Sign a credential hash with `provider`.
///
/// # Errors
///
/// `VcError::Signing` if the provider cannot sign or report its address.
pub fn sign_hash(
    hash: ContentDigest,
    provider: &dyn KeyProvider,
    now: Timestamp,
) -> Result<SignatureEnvelope, VcError> {
    let signature = provider.sign_message(&hash.bytes)?;
    let signer_address = provider.address()?;
    Ok(SignatureEnvelope {
        hash,
        signature,
        signer_address,
        signed_at: now,
    })
}

/// Hash `vc` and sign the hash.
pub fn sign_vc(
    vc: &AgentVc,
    provider: &dyn KeyProvider,
    now: Timestamp,
) -> Result<SignatureEnvelope, VcError> {
    sign_hash(canonical_hash(vc)?, provider, now)
}
