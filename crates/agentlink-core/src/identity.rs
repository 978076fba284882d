//! # Domain Identity Newtypes
//!
//! Validated wrappers for the identifiers that flow through a link:
//! the agent's chain address, the credential id, the user id and
//! identity-proof nullifiers.
//!
//! ## Security Invariant
//!
//! Every constructor validates. A `ChainAddress` is always 20 bytes and a
//! mixed-case input that fails its EIP-55 checksum is rejected, so a
//! mistyped agent address cannot be bound into a credential.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::keccak256;
use crate::error::ValidationError;

/// A 20-byte EVM account address.
///
/// Equality is byte equality, so `0xabc…` and `0xABC…` compare equal.
/// Renders and serializes in EIP-55 checksummed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainAddress([u8; 20]);

impl ChainAddress {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed 40-hex-char address.
    ///
    /// All-lowercase and all-uppercase inputs are accepted as-is. Mixed-case
    /// inputs must match their EIP-55 checksum.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAddress {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let hex = s.strip_prefix("0x").ok_or_else(|| invalid("missing 0x prefix"))?;
        if hex.len() != 40 {
            return Err(invalid("expected 40 hex characters"));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("non-hex character"));
        }

        let mut bytes = [0u8; 20];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hi = hex_val(chunk[0]);
            let lo = hex_val(chunk[1]);
            bytes[i] = (hi << 4) | lo;
        }
        let addr = Self(bytes);

        let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && addr.to_checksum() != s {
            return Err(ValidationError::AddressChecksum(s.to_string()));
        }
        Ok(addr)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed form. Used as the store index key.
    pub fn to_lower_hex(&self) -> String {
        let mut s = String::with_capacity(42);
        s.push_str("0x");
        for b in self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }

    /// EIP-55 mixed-case checksum form.
    pub fn to_checksum(&self) -> String {
        let lower = self.to_lower_hex();
        let body = &lower[2..];
        let hash = keccak256(body.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in body.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

impl std::fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl std::fmt::Debug for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChainAddress({})", self.to_checksum())
    }
}

impl std::str::FromStr for ChainAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ChainAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for ChainAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const VC_ID_SUFFIX_LEN: usize = 9;

/// Credential identifier: `vc_<epoch-millis>_<9 base36 chars>`.
///
/// Unique enough for this system's issuance rate. The store's
/// `(agentId, userId)` constraint is what actually prevents duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VcId(String);

impl VcId {
    /// Generate a fresh id from the current wall clock.
    pub fn generate() -> Self {
        Self::generate_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generate a fresh id for the given epoch-millis instant.
    pub fn generate_at(epoch_millis: i64) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..VC_ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("vc_{epoch_millis}_{suffix}"))
    }

    /// Validate an existing id.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let bad = || ValidationError::InvalidVcId(s.to_string());
        let rest = s.strip_prefix("vc_").ok_or_else(bad)?;
        let (millis, suffix) = rest.split_once('_').ok_or_else(bad)?;
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        if suffix.len() != VC_ID_SUFFIX_LEN || !suffix.bytes().all(|b| BASE36.contains(&b)) {
            return Err(bad());
        }
        Ok(Self(s.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VcId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VcId> for String {
    fn from(id: VcId) -> Self {
        id.0
    }
}

impl std::fmt::Display for VcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Wrap a non-empty id.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier("userId"));
        }
        Ok(Self(s))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An identity-proof nullifier: one per human per verifying action.
///
/// Hex forms are normalized to lowercase so the same nullifier reported
/// with different casing compares equal. Decimal field elements are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nullifier(String);

impl Nullifier {
    /// Validate and normalize a nullifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentifier("nullifier"));
        }
        let normalized = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => {
                if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(ValidationError::InvalidHex(trimmed.to_string()));
                }
                format!("0x{}", hex.to_ascii_lowercase())
            }
            None => trimmed.to_string(),
        };
        Ok(Self(normalized))
    }

    /// The normalized nullifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nullifier {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Nullifier> for String {
    fn from(n: Nullifier) -> Self {
        n.0
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
