//! # Key Provider Abstraction
//!
//! Abstracts the platform signing key behind a trait:
//!
//! - [`LocalKeyProvider`]: in-memory key for development and testing.
//! - [`EnvKeyProvider`]: loads a hex-encoded secp256k1 key from an
//!   environment variable. Suitable for container deployments where secrets
//!   are injected via environment.
//! - [`UnavailableKeyProvider`]: a deployment with no signer configured.
//!   Every call fails with `ProviderUnavailable`.
//!
//! ## Security Invariants
//!
//! - Key material is zeroized on drop.
//! - `KeyProvider` is `Send + Sync` for use across async tasks.

use agentlink_core::ChainAddress;

use crate::error::CryptoError;
use crate::eth::{EthSigningKey, RecoverableSignature};

/// Trait for secp256k1 signing backends.
pub trait KeyProvider: Send + Sync {
    /// Sign `msg` as an EIP-191 personal message.
    fn sign_message(&self, msg: &[u8]) -> Result<RecoverableSignature, CryptoError>;

    /// The address signatures from this provider recover to.
    fn address(&self) -> Result<ChainAddress, CryptoError>;

    /// Human-readable name for this provider (for diagnostics/logging).
    fn provider_name(&self) -> &str;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory key provider for development and testing.
pub struct LocalKeyProvider {
    key: EthSigningKey,
}

impl LocalKeyProvider {
    /// Wrap an existing signing key.
    pub fn new(key: EthSigningKey) -> Self {
        Self { key }
    }

    /// Generate a new random key using the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            key: EthSigningKey::generate(),
        }
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign_message(&self, msg: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.key.sign_message(msg)
    }

    fn address(&self) -> Result<ChainAddress, CryptoError> {
        Ok(self.key.address())
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads a secp256k1 signing key from an environment variable.
///
/// The variable holds 64 hex chars (optionally `0x`-prefixed). The key is
/// read once at construction.
///
/// ```bash
/// export AGENTLINK_SIGNER_KEY="0x4c0883a6..."  # 64 hex chars
/// ```
pub struct EnvKeyProvider {
    key: EthSigningKey,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load the signing key from the named environment variable.
    ///
    /// Returns `CryptoError::ProviderUnavailable` if the variable is unset
    /// and `InvalidSigningKey`/`HexDecode` if its content is not a key.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let hex = zeroize::Zeroizing::new(std::env::var(var_name).map_err(|_| {
            CryptoError::ProviderUnavailable(format!("environment variable {var_name} not set"))
        })?);
        let key = EthSigningKey::from_hex(&hex)?;
        Ok(Self {
            key,
            var_name: var_name.to_string(),
        })
    }

    /// The environment variable this provider was loaded from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign_message(&self, msg: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.key.sign_message(msg)
    }

    fn address(&self) -> Result<ChainAddress, CryptoError> {
        Ok(self.key.address())
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

// ─── UnavailableKeyProvider ──────────────────────────────────────────────

/// Stands in for a signer that is not configured or not reachable.
#[derive(Debug, Clone)]
pub struct UnavailableKeyProvider {
    reason: String,
}

impl UnavailableKeyProvider {
    /// Every call will fail with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KeyProvider for UnavailableKeyProvider {
    fn sign_message(&self, _msg: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        Err(CryptoError::ProviderUnavailable(self.reason.clone()))
    }

    fn address(&self) -> Result<ChainAddress, CryptoError> {
        Err(CryptoError::ProviderUnavailable(self.reason.clone()))
    }

    fn provider_name(&self) -> &str {
        "UnavailableKeyProvider"
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
