//! Wishlist configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WISHLIST_API_URL` - Endpoint for the durable wishlist record
//! - `WISHLIST_API_TOKEN` - Bearer token for the endpoint
//!
//! ## Optional
//! - `WISHLIST_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Wishlist application configuration.
#[derive(Debug, Clone)]
pub struct WishlistConfig {
    /// Wishlist API configuration.
    pub api: WishlistApiConfig,
}

/// Wishlist API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct WishlistApiConfig {
    /// Endpoint for the durable wishlist record.
    pub endpoint: Url,
    /// Bearer token authenticating the visitor's session server-side.
    pub access_token: SecretString,
    /// Request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for WishlistApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistApiConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WishlistConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint_raw = require_env("WISHLIST_API_URL")?;
        let endpoint = Url::parse(&endpoint_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("WISHLIST_API_URL".to_string(), e.to_string())
        })?;

        let access_token = SecretString::from(require_env("WISHLIST_API_TOKEN")?);

        let timeout_secs = match std::env::var("WISHLIST_API_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("WISHLIST_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api: WishlistApiConfig {
                endpoint,
                access_token,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = WishlistApiConfig {
            endpoint: Url::parse("https://shop.example.com/apps/wishlist").expect("url"),
            access_token: SecretString::from("super-secret-token"),
            timeout: Duration::from_secs(10),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("WISHLIST_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: WISHLIST_API_URL"
        );
    }
}
