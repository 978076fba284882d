//! # agentlink-crypto — Signing for AgentLink Credentials
//!
//! secp256k1 ECDSA with Ethereum personal-message (EIP-191) framing.
//! A credential signature is what `personal_sign` in a wallet would produce
//! over the 32 raw bytes of the credential hash, so any Ethereum tooling can
//! recover the signer.
//!
//! ## Modules
//!
//! - [`eth`]: signing keys, 65-byte recoverable signatures, signer recovery,
//!   address derivation.
//! - [`key_provider`]: the `KeyProvider` trait and its backends.
//! - [`hex`]: the small hex codec shared by the above.
//!
//! ## Crate Policy
//!
//! - Private keys never implement `Serialize` and their `Debug` output
//!   shows only the derived address.
//! - Verification failure is a value, not a panic.

pub mod error;
pub mod eth;
pub mod hex;
pub mod key_provider;

pub use error::CryptoError;
pub use eth::{
    address_from_verifying_key, eip191_hash, recover_message_signer, EthSigningKey,
    RecoverableSignature,
};
pub use key_provider::{EnvKeyProvider, KeyProvider, LocalKeyProvider, UnavailableKeyProvider};
