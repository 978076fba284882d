//! # Link Configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```yaml
//! issuer: did:web:agentlink.example
//! credential_schema: agentlink:schema:agent-link:v1
//! version: "1.0"
//! signer:
//!   mode: platform        # or: holder
//!   key_env: AGENTLINK_SIGNER_KEY
//! ```

use std::path::{Path, PathBuf};

use agentlink_vc::IssuerProfile;
use serde::{Deserialize, Serialize};

/// Default environment variable holding the platform signing key.
pub const DEFAULT_SIGNER_KEY_ENV: &str = "AGENTLINK_SIGNER_KEY";

/// Who signs a new credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerMode {
    /// The platform key signs at link time. The credential attests that the
    /// platform observed the linkage.
    #[default]
    Platform,
    /// The human's own wallet signs the credential hash. The credential
    /// attests that the human endorsed the linkage.
    Holder,
}

impl std::fmt::Display for SignerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Platform => "platform",
            Self::Holder => "holder",
        })
    }
}

/// Signer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignerConfig {
    pub mode: SignerMode,
    /// Environment variable the platform key is read from.
    pub key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            mode: SignerMode::Platform,
            key_env: DEFAULT_SIGNER_KEY_ENV.to_string(),
        }
    }
}

/// Link service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    pub issuer: String,
    pub credential_schema: String,
    pub version: String,
    pub credential_types: Vec<String>,
    pub signer: SignerConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let profile = IssuerProfile::default();
        Self {
            issuer: profile.issuer,
            credential_schema: profile.credential_schema,
            version: profile.version,
            credential_types: profile.credential_types,
            signer: SignerConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Provenance stamped into assembled credentials.
    pub fn issuer_profile(&self) -> IssuerProfile {
        IssuerProfile {
            issuer: self.issuer.clone(),
            credential_schema: self.credential_schema.clone(),
            version: self.version.clone(),
            credential_types: self.credential_types.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("issuer", &self.issuer),
            ("credential_schema", &self.credential_schema),
            ("version", &self.version),
            ("signer.key_env", &self.signer.key_env),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if self.credential_types.is_empty() {
            return Err(ConfigError::Invalid(
                "credential_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Parse(serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
