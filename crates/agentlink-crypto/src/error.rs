//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from signing, recovery and key loading.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key bytes are not a valid secp256k1 scalar.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// Signature bytes are malformed (length, recovery byte, scalar range).
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// Public key recovery failed for a well-formed signature.
    #[error("signer recovery failed: {0}")]
    Recovery(String),

    /// The ECDSA backend refused to sign.
    #[error("signing failed: {0}")]
    Signing(String),

    /// No key is available to this provider.
    #[error("key provider unavailable: {0}")]
    ProviderUnavailable(String),
}
