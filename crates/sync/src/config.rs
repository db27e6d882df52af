//! Run configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ACCESS_TOKEN` - Admin API access token (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `MEDIA_SYNC_KEY_FIELD` - Metafield holding the primary lookup key
//!   as `namespace.key` (default: custom.number)
//! - `MEDIA_SYNC_POLL_INTERVAL_SECS` - Media readiness poll interval (default: 2)
//! - `MEDIA_SYNC_POLL_TIMEOUT_SECS` - Media readiness poll timeout (default: 60)
//! - `MEDIA_SYNC_CONCURRENCY` - Parallel upload units (default: 4)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2026-01";
const DEFAULT_KEY_FIELD: &str = "custom.number";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONCURRENCY: usize = 4;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Full run configuration, threaded through constructors as an immutable
/// value. Never read from ambient state after loading.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Shopify Admin API configuration.
    pub shopify: ShopifyConfig,
    /// Interval between media readiness polls.
    pub poll_interval: Duration,
    /// Give-up deadline for media readiness polling.
    pub poll_timeout: Duration,
    /// Default number of parallel upload units.
    pub concurrency: usize,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Admin API access token (HIGH PRIVILEGE - full store access)
    pub access_token: SecretString,
    /// Metafield `namespace.key` carrying the primary lookup identifier.
    pub key_field: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("key_field", &self.key_field)
            .finish()
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token fails placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let shopify = ShopifyConfig::from_env()?;
        let poll_interval = Duration::from_secs(get_parsed_or_default(
            "MEDIA_SYNC_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let poll_timeout = Duration::from_secs(get_parsed_or_default(
            "MEDIA_SYNC_POLL_TIMEOUT_SECS",
            DEFAULT_POLL_TIMEOUT_SECS,
        )?);
        let concurrency =
            get_parsed_or_default("MEDIA_SYNC_CONCURRENCY", DEFAULT_CONCURRENCY)?.max(1);

        Ok(Self {
            shopify,
            poll_interval,
            poll_timeout,
            concurrency,
        })
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            access_token: get_validated_secret("SHOPIFY_ACCESS_TOKEN")?,
            key_field: get_env_or_default("MEDIA_SYNC_KEY_FIELD", DEFAULT_KEY_FIELD),
        })
    }

    /// Split the configured key field into `(namespace, key)`.
    #[must_use]
    pub fn key_field_parts(&self) -> (&str, &str) {
        self.key_field
            .split_once('.')
            .unwrap_or(("custom", self.key_field.as_str()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional environment variable parsed into `T`, falling back to a
/// default when unset.
fn get_parsed_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_tokens_are_rejected() {
        assert!(validate_secret_strength("shpat_a91c22f0e4", "T").is_ok());
        assert!(validate_secret_strength("your-token-here", "T").is_err());
        assert!(validate_secret_strength("CHANGEME", "T").is_err());
    }

    #[test]
    fn key_field_splits_namespace() {
        let config = ShopifyConfig {
            store: "test.myshopify.com".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: SecretString::from("shpat_a91c22f0e4"),
            key_field: "custom.number".to_string(),
        };
        assert_eq!(config.key_field_parts(), ("custom", "number"));

        let bare = ShopifyConfig {
            key_field: "number".to_string(),
            ..config
        };
        assert_eq!(bare.key_field_parts(), ("custom", "number"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = ShopifyConfig {
            store: "test.myshopify.com".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: SecretString::from("shpat_a91c22f0e4"),
            key_field: "custom.number".to_string(),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("shpat_"));
    }
}
