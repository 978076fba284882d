//! # secp256k1 Personal-Message Signatures
//!
//! Ethereum-compatible signing and signer recovery.
//!
//! ## Security Invariant
//!
//! - Every signature is over the EIP-191 personal-message hash
//!   `keccak256("\x19Ethereum Signed Message:\n" ‖ len(msg) ‖ msg)`, never
//!   over a bare digest. Verification uses the same framing, so a signature
//!   produced by a wallet's `personal_sign` verifies here and vice versa.
//! - `EthSigningKey` does not implement `Serialize` and its `Debug` shows
//!   only the public address. The inner k256 key zeroizes on drop.
//! - Signatures are emitted in low-S form. High-S inputs are normalized
//!   before recovery.

use agentlink_core::{keccak256, ChainAddress};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::hex;

const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// EIP-191 personal-message hash of `msg`.
pub fn eip191_hash(msg: &[u8]) -> [u8; 32] {
    let len = msg.len().to_string();
    let mut framed = Vec::with_capacity(EIP191_PREFIX.len() + len.len() + msg.len());
    framed.extend_from_slice(EIP191_PREFIX);
    framed.extend_from_slice(len.as_bytes());
    framed.extend_from_slice(msg);
    keccak256(&framed)
}

/// Ethereum address of a secp256k1 public key: the last 20 bytes of the
/// Keccak-256 of the uncompressed point without its `0x04` tag.
pub fn address_from_verifying_key(key: &VerifyingKey) -> ChainAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    ChainAddress::from_bytes(addr)
}

// ---------------------------------------------------------------------------
// EthSigningKey
// ---------------------------------------------------------------------------

/// A secp256k1 private key used to sign credential hashes.
#[derive(Clone)]
pub struct EthSigningKey {
    inner: SigningKey,
}

impl EthSigningKey {
    /// Generate a new random key using the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::random(&mut rand_core::OsRng),
        }
    }

    /// Load a key from its 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_slice(bytes)
            .map(|inner| Self { inner })
            .map_err(|_| CryptoError::InvalidSigningKey("scalar out of range".to_string()))
    }

    /// Load a key from 64 hex chars, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = zeroize::Zeroizing::new(hex::decode(hex_str)?);
        let seed: &[u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidSigningKey(format!(
                "expected 32 bytes (64 hex chars), got {} bytes",
                bytes.len()
            ))
        })?;
        Self::from_bytes(seed)
    }

    /// Export the private scalar as `0x`-prefixed hex. Used only by
    /// `agentlink keygen`.
    pub fn to_hex(&self) -> zeroize::Zeroizing<String> {
        zeroize::Zeroizing::new(hex::encode_prefixed(&self.inner.to_bytes()))
    }

    /// The public verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.inner.verifying_key()
    }

    /// The Ethereum address this key signs as.
    pub fn address(&self) -> ChainAddress {
        address_from_verifying_key(self.inner.verifying_key())
    }

    /// Sign `msg` as an EIP-191 personal message.
    pub fn sign_message(&self, msg: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        let digest = eip191_hash(msg);
        let (sig, recid) = self
            .inner
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(RecoverableSignature::from_parts(&sig, recid))
    }
}

impl std::fmt::Debug for EthSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthSigningKey({})", self.address())
    }
}

// ---------------------------------------------------------------------------
// RecoverableSignature
// ---------------------------------------------------------------------------

/// A 65-byte `r ‖ s ‖ v` signature with `v ∈ {27, 28}`.
///
/// Serializes as `0x`-prefixed hex (132 chars), the form `personal_sign`
/// returns.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature([u8; 65]);

impl RecoverableSignature {
    fn from_parts(sig: &Signature, recid: RecoveryId) -> Self {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = 27 + recid.to_byte();
        Self(out)
    }

    /// Parse 65 raw bytes. Accepts `v` as 27/28 or 0/1 and stores 27/28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!("expected 65 bytes, got {}", bytes.len()))
        })?;
        let mut out = arr;
        out[64] = match arr[64] {
            0 | 1 => arr[64] + 27,
            27 | 28 => arr[64],
            v => {
                return Err(CryptoError::InvalidSignature(format!(
                    "recovery byte must be 0, 1, 27 or 28, got {v}"
                )))
            }
        };
        Ok(Self(out))
    }

    /// Parse 130 hex chars, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Raw 65 bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    /// The `v` byte (27 or 28).
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    fn to_k256(self) -> Result<(Signature, RecoveryId), CryptoError> {
        let sig = Signature::from_slice(&self.0[..64])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recid = RecoveryId::from_byte(self.0[64] - 27)
            .ok_or_else(|| CryptoError::InvalidSignature("bad recovery byte".to_string()))?;
        Ok(match sig.normalize_s() {
            Some(low) => (low, RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())),
            None => (sig, recid),
        })
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoverableSignature({}...)", &self.to_hex()[..18])
    }
}

impl std::fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Recover the address that signed `msg` as an EIP-191 personal message.
///
/// A well-formed signature by a different key recovers to a different
/// address; comparing that address to the expected signer is the caller's
/// job.
pub fn recover_message_signer(
    msg: &[u8],
    signature: &RecoverableSignature,
) -> Result<ChainAddress, CryptoError> {
    let (sig, recid) = signature.to_k256()?;
    let digest = eip191_hash(msg);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recid)
        .map_err(|e| CryptoError::Recovery(e.to_string()))?;
    Ok(address_from_verifying_key(&key))
}
