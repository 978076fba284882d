//! # Content Digest — Credential Hashes
//!
//! Defines `ContentDigest` and `DigestAlgorithm`.
//!
//! ## Security Invariant
//!
//! A credential hash can only be computed from `CanonicalBytes`. This is
//! enforced by the signatures of [`keccak256_digest()`] and
//! [`sha256_digest()`].
//!
//! Keccak-256 (the pre-NIST padding used by Ethereum, not SHA3-256) is the
//! credential hash: it is what the wallet signs and what a contract would
//! recompute. SHA-256 keys the verification cache.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// Ethereum Keccak-256. Credential hashes.
    Keccak256,
    /// SHA-256. Cache keys.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte digest with its algorithm tag.
///
/// Displays and serializes as `"<algorithm>:<hex>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a digest from raw bytes and algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Render as `0x`-prefixed lowercase hex, the form wallets and contracts
    /// expect for a `bytes32`.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Parse a `0x`-prefixed 64-char hex string produced by
    /// [`to_prefixed_hex()`](Self::to_prefixed_hex).
    pub fn from_prefixed_hex(
        algorithm: DigestAlgorithm,
        s: &str,
    ) -> Result<Self, ValidationError> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidDigest(format!("missing 0x prefix: {s:?}")))?;
        Ok(Self::new(algorithm, decode_hex32(hex)?))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alg, hex) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidDigest(format!("missing algorithm tag: {s:?}")))?;
        let algorithm = match alg {
            "keccak256" => DigestAlgorithm::Keccak256,
            "sha256" => DigestAlgorithm::Sha256,
            other => {
                return Err(ValidationError::InvalidDigest(format!(
                    "unknown algorithm {other:?}"
                )))
            }
        };
        Ok(Self::new(algorithm, decode_hex32(hex)?))
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn decode_hex32(hex: &str) -> Result<[u8; 32], ValidationError> {
    if hex.len() != 64 {
        return Err(ValidationError::InvalidDigest(format!(
            "expected 64 hex chars, got {}",
            hex.len()
        )));
    }
    let mut out = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk)
            .map_err(|_| ValidationError::InvalidHex(hex.to_string()))?;
        out[i] = u8::from_str_radix(pair, 16)
            .map_err(|_| ValidationError::InvalidHex(hex.to_string()))?;
    }
    Ok(out)
}

/// Raw Keccak-256 over arbitrary bytes.
///
/// For address derivation and EIP-191 message prefixing only. Credential
/// content goes through [`keccak256_digest()`].
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Compute the Keccak-256 credential hash from canonical bytes.
///
/// # Security Invariant
///
/// Accepts only `&CanonicalBytes`, not raw `&[u8]`.
pub fn keccak256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest::new(DigestAlgorithm::Keccak256, keccak256(data.as_bytes()))
}

/// Compute a SHA-256 digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}
