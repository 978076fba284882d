//! Identity verifier configuration.
//!
//! Base URLs and limits for the World ID cloud verifier and the Self
//! Protocol backend verifier. Loaded from environment variables, or built
//! explicitly for tests.

use std::time::Duration;

use url::Url;

/// Configuration for the identity verifier collaborators.
///
/// Custom `Debug` implementation redacts `self_api_key`.
#[derive(Clone)]
pub struct VerifierConfig {
    /// World ID developer portal base URL.
    /// Default: <https://developer.worldcoin.org>
    pub world_id_base_url: Url,
    /// World ID application id (`app_…`).
    pub world_id_app_id: String,
    /// World ID action the proof was generated for.
    pub world_id_action: String,
    /// Self Protocol backend verifier base URL.
    pub self_verifier_url: Url,
    /// Optional bearer token for the Self verifier.
    pub self_api_key: Option<zeroize::Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// How long a successful verification is reused.
    pub cache_ttl_secs: u64,
    /// Maximum cached verifications per verifier.
    pub cache_capacity: usize,
}

impl std::fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("world_id_base_url", &self.world_id_base_url)
            .field("world_id_app_id", &self.world_id_app_id)
            .field("world_id_action", &self.world_id_action)
            .field("self_verifier_url", &self.self_verifier_url)
            .field(
                "self_api_key",
                &self.self_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `WORLD_ID_BASE_URL` (default: `https://developer.worldcoin.org`)
    /// - `WORLD_ID_APP_ID` (required)
    /// - `WORLD_ID_ACTION` (default: `link-agent`)
    /// - `SELF_VERIFIER_URL` (required)
    /// - `SELF_VERIFIER_API_KEY` (optional)
    /// - `VERIFIER_TIMEOUT_SECS` (default: 10)
    /// - `VERIFICATION_CACHE_TTL_SECS` (default: 300)
    /// - `VERIFICATION_CACHE_CAPACITY` (default: 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let world_id_app_id =
            std::env::var("WORLD_ID_APP_ID").map_err(|_| ConfigError::Missing("WORLD_ID_APP_ID"))?;
        let self_raw = std::env::var("SELF_VERIFIER_URL")
            .map_err(|_| ConfigError::Missing("SELF_VERIFIER_URL"))?;

        Ok(Self {
            world_id_base_url: env_url("WORLD_ID_BASE_URL", "https://developer.worldcoin.org")?,
            world_id_app_id,
            world_id_action: std::env::var("WORLD_ID_ACTION")
                .unwrap_or_else(|_| "link-agent".to_string()),
            self_verifier_url: Url::parse(&self_raw).map_err(|e| {
                ConfigError::InvalidUrl("SELF_VERIFIER_URL".to_string(), e.to_string())
            })?,
            self_api_key: std::env::var("SELF_VERIFIER_API_KEY")
                .ok()
                .map(zeroize::Zeroizing::new),
            timeout_secs: env_number("VERIFIER_TIMEOUT_SECS", 10)?,
            cache_ttl_secs: env_number("VERIFICATION_CACHE_TTL_SECS", 300)?,
            cache_capacity: env_number("VERIFICATION_CACHE_CAPACITY", 10_000)?,
        })
    }

    /// A configuration pointing both verifiers at one local mock server.
    pub fn local_mock(base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        Ok(Self {
            world_id_base_url: url.clone(),
            world_id_app_id: "app_staging_test".to_string(),
            world_id_action: "link-agent".to_string(),
            self_verifier_url: url,
            self_api_key: None,
            timeout_secs: 5,
            cache_ttl_secs: 300,
            cache_capacity: 1_000,
        })
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
}
