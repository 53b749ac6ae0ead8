//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ZONE7_CMS_URL` - Headless CMS origin (e.g., `http://localhost:1337`)
//!
//! ## Optional
//! - `ZONE7_CMS_API_TOKEN` - Read-only CMS API token for catalog requests
//! - `ZONE7_HTTP_TIMEOUT_SECS` - CMS request timeout (default: 10)
//! - `ZONE7_CATALOG_CACHE_TTL_SECS` - Product/category cache TTL (default: 300)
//! - `ZONE7_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 1000)
//! - `ZONE7_FLAT_SHIPPING_RATE` - Shipping below the threshold (default: 50)
//! - `ZONE7_HOST` - Bind address (default: 127.0.0.1)
//! - `ZONE7_PORT` - Listen port (default: 3000)
//! - `ZONE7_BASE_URL` - Public URL of the API (default: `http://localhost:3000`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;
use zone7_core::cart::ShippingPolicy;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Headless CMS connection settings.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CmsConfig {
    /// CMS origin. REST endpoints live under `{base_url}/api/`.
    pub base_url: Url,
    /// Optional read-only token used for catalog requests.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long product and category listings stay cached.
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl CmsConfig {
    /// Settings for a CMS at `base_url` with default timeouts and no token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ZONE7_CMS_URL", base_url)?,
            api_token: None,
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
        })
    }

    /// Load CMS settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `ZONE7_CMS_URL` is missing or any value is
    /// malformed, or if the API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url("ZONE7_CMS_URL", &get_required_env("ZONE7_CMS_URL")?)?;
        let api_token = get_optional_env("ZONE7_CMS_API_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "ZONE7_CMS_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(parse_env_or("ZONE7_HTTP_TIMEOUT_SECS", 10)?),
            catalog_cache_ttl: Duration::from_secs(parse_env_or(
                "ZONE7_CATALOG_CACHE_TTL_SECS",
                300,
            )?),
        })
    }
}

/// Settings shared by every front end of the storefront library.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cms: CmsConfig,
    pub shipping: ShippingPolicy,
}

impl ClientConfig {
    /// Load CMS and shipping settings from the environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            cms: CmsConfig::from_env()?,
            shipping: shipping_policy_from_env()?,
        })
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// CMS and shipping settings
    pub client: ClientConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client = ClientConfig::from_env()?;

        let host = get_env_or_default("ZONE7_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ZONE7_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or("ZONE7_PORT", 3000)?;
        let base_url = get_env_or_default("ZONE7_BASE_URL", "http://localhost:3000");

        Ok(Self {
            client,
            host,
            port,
            base_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_env_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the API is served over HTTPS (controls the secure cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Load the shipping policy, falling back to 1000 / 50.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if either amount is not a
/// non-negative decimal.
pub fn shipping_policy_from_env() -> Result<ShippingPolicy, ConfigError> {
    let defaults = ShippingPolicy::default();
    Ok(ShippingPolicy {
        free_shipping_threshold: parse_amount_or(
            "ZONE7_FREE_SHIPPING_THRESHOLD",
            defaults.free_shipping_threshold,
        )?,
        flat_rate: parse_amount_or("ZONE7_FLAT_SHIPPING_RATE", defaults.flat_rate)?,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_amount_or(key: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    let amount = parse_env_or(key, default)?;
    if amount.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(amount)
}

/// Parse a base URL, requiring http(s) and normalizing a trailing slash.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
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

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token generated by the CMS."
            ),
        ));
    }

    Ok(())
}

/// Expose a token for an `Authorization` header.
pub(crate) fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
