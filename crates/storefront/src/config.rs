//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPHUB_API_BASE_URL` - Base URL of the commerce REST API (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `SHOPHUB_AUTH_TOKEN` - Bearer token issued by the auth service
//! - `SHOPHUB_USER_ID` - ID of the signed-in account (required when a token is set)
//! - `SHOPHUB_USER_NAME` - Display name of the signed-in account
//! - `SHOPHUB_USER_ROLE` - `user`, `vendor` or `admin` (default: user)
//! - `SHOPHUB_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPHUB_PRODUCT_CACHE_TTL_SECS` - Product detail memoization TTL (default: 300)
//! - `SHOPHUB_PRODUCT_CACHE_CAPACITY` - Product detail memoization capacity (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use shophub_core::{UserId, UserRole};
use thiserror::Error;
use url::Url;

const MIN_AUTH_TOKEN_LENGTH: usize = 16;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
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

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST API connection settings
    pub api: ApiConfig,
    /// Signed-in account, if any
    pub credentials: Option<Credentials>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. `production`)
    pub sentry_environment: Option<String>,
}

/// REST API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without a trailing slash; endpoint paths are appended verbatim
    pub base_url: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// How long fetched product details are reused
    pub product_cache_ttl: Duration,
    /// Maximum number of memoized products
    pub product_cache_capacity: u64,
}

impl ApiConfig {
    /// Settings for `base_url` with default timeout and cache sizing.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
            product_cache_ttl: Duration::from_secs(300),
            product_cache_capacity: 1000,
        }
    }
}

/// Credentials of the account the storefront acts for.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Credentials {
    /// Bearer token
    pub token: SecretString,
    /// Account ID
    pub user_id: UserId,
    /// Display name
    pub name: Option<String>,
    /// Account role
    pub role: UserRole,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the auth token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api = ApiConfig::from_lookup(&lookup)?;
        let credentials = Credentials::from_lookup(&lookup)?;

        Ok(Self {
            api,
            credentials,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_required(lookup, "SHOPHUB_API_BASE_URL")?;
        validate_base_url(&base_url, "SHOPHUB_API_BASE_URL")?;

        let mut config = Self::new(base_url);
        config.request_timeout =
            Duration::from_secs(get_parsed(lookup, "SHOPHUB_REQUEST_TIMEOUT_SECS", 30)?);
        config.product_cache_ttl =
            Duration::from_secs(get_parsed(lookup, "SHOPHUB_PRODUCT_CACHE_TTL_SECS", 300)?);
        config.product_cache_capacity =
            get_parsed(lookup, "SHOPHUB_PRODUCT_CACHE_CAPACITY", 1000)?;

        if config.request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPHUB_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Credentials {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let token = lookup("SHOPHUB_AUTH_TOKEN");
        let user_id = lookup("SHOPHUB_USER_ID");

        // A token without an account (or the reverse) is a half-configured session.
        let (token, user_id) = match (token, user_id) {
            (None, None) => return Ok(None),
            (Some(token), Some(user_id)) => (token, user_id),
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("SHOPHUB_USER_ID".to_string())),
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("SHOPHUB_AUTH_TOKEN".to_string()));
            }
        };

        validate_token(&token, "SHOPHUB_AUTH_TOKEN")?;

        let role = match lookup("SHOPHUB_USER_ROLE") {
            Some(raw) => raw
                .parse::<UserRole>()
                .map_err(|e| ConfigError::InvalidEnvVar("SHOPHUB_USER_ROLE".to_string(), e))?,
            None => UserRole::Customer,
        };

        Ok(Some(Self {
            token: SecretString::from(token),
            user_id: UserId::new(user_id),
            name: lookup("SHOPHUB_USER_NAME"),
            role,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset.
fn get_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// The API base must be an absolute http(s) URL.
fn validate_base_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
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

/// Validate that a token is long enough, not a placeholder, and has sufficient entropy.
fn validate_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.len() < MIN_AUTH_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_AUTH_TOKEN_LENGTH} characters (got {})",
                token.len()
            ),
        ));
    }

    let lower = token.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
