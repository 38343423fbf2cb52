//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public URL of the API (used for payment callback URLs)
//! - `STRIPE_SECRET_KEY` - Stripe API secret key
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `STRIPE_CURRENCY` - ISO currency code for checkout (default: usd)
//! - `CART_TTL_SECS` - Sliding cart expiration window (default: 3600)
//! - `CART_OP_TIMEOUT_MS` - Per-call cart store timeout (default: 2000)
//! - `CART_DEGRADED_READS` - When `true`, plain cart reads degrade to an
//!   empty cart if the store is unavailable instead of failing (default:
//!   false; mutations always surface store failures)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Stripe checkout configuration
    pub stripe: StripeConfig,
    /// Cart store configuration
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Stripe checkout configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe API secret key
    pub secret_key: SecretString,
    /// ISO currency code used for checkout sessions
    pub currency: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Sliding expiration window for cart records
    pub ttl: Duration,
    /// Upper bound on a single store round trip
    pub op_timeout: Duration,
    /// Whether plain reads fall back to an empty cart when the store is
    /// unavailable
    pub degraded_reads: bool,
}

impl ApiConfig {
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

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "3000")?;
        let base_url = get_required_env("BASE_URL")?;

        let stripe = StripeConfig {
            secret_key: SecretString::from(get_required_env("STRIPE_SECRET_KEY")?),
            currency: get_env_or_default("STRIPE_CURRENCY", "usd"),
        };

        let cart = CartConfig {
            ttl: Duration::from_secs(parse_env("CART_TTL_SECS", "3600")?),
            op_timeout: Duration::from_millis(parse_env("CART_OP_TIMEOUT_MS", "2000")?),
            degraded_reads: parse_env("CART_DEGRADED_READS", "false")?,
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            stripe,
            cart,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable, falling back to a default.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_123"),
                currency: "usd".to_string(),
            },
            cart: CartConfig {
                ttl: Duration::from_secs(3600),
                op_timeout: Duration::from_millis(2000),
                degraded_reads: false,
            },
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_stripe_config_debug_redacts_secret() {
        let config = StripeConfig {
            secret_key: SecretString::from("sk_live_super_secret"),
            currency: "usd".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("usd"));
        assert!(!debug_output.contains("sk_live_super_secret"));
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let port: u16 = parse_env("BRAMBLE_TEST_UNSET_PORT", "4242").unwrap();
        assert_eq!(port, 4242);

        let degraded: bool = parse_env("BRAMBLE_TEST_UNSET_FLAG", "false").unwrap();
        assert!(!degraded);
    }
}
