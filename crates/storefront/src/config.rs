//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session secret (min 32 chars, high entropy).
//!   Reserved for signing the session cookie: session IDs are random and all
//!   session data stays server-side, so nothing is signed with it yet. It is
//!   still required so deployments carry a strong key before signing is on.
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DEBUG` - Debug mode (default: false)
//! - `STOREFRONT_ALLOWED_HOSTS` - Comma-separated `Host` values to accept (default: any)
//! - `STOREFRONT_STATIC_DIR` - Static assets directory (default: `crates/storefront/static`)
//! - `STOREFRONT_MEDIA_DIR` - Uploaded product images (default: `media`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Minimum accepted session secret length.
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Minimum Shannon entropy of a secret, in bits per character.
pub const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "change-me",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "insecure",
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

/// Result of checking a secret value.
///
/// Shared with the CLI's deployment checker so both report the same rules.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretAssessment {
    /// Long enough, not a placeholder, enough entropy.
    Strong,
    /// Shorter than [`MIN_SESSION_SECRET_LENGTH`].
    TooShort {
        /// Actual length in characters.
        length: usize,
    },
    /// Contains a known placeholder pattern.
    Placeholder {
        /// The matched pattern.
        pattern: &'static str,
    },
    /// Below [`MIN_ENTROPY_BITS_PER_CHAR`].
    LowEntropy {
        /// Measured entropy in bits per character.
        bits_per_char: f64,
    },
}

impl SecretAssessment {
    /// Assess a secret.
    #[must_use]
    pub fn of(secret: &str) -> Self {
        let length = secret.chars().count();
        if length < MIN_SESSION_SECRET_LENGTH {
            return Self::TooShort { length };
        }

        let lower = secret.to_lowercase();
        if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
            return Self::Placeholder { pattern };
        }

        let bits_per_char = shannon_entropy(secret);
        if bits_per_char < MIN_ENTROPY_BITS_PER_CHAR {
            return Self::LowEntropy { bits_per_char };
        }

        Self::Strong
    }

    /// Whether the secret is acceptable.
    #[must_use]
    pub const fn is_strong(&self) -> bool {
        matches!(self, Self::Strong)
    }

    /// Human-readable reason for a rejected secret.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Strong => None,
            Self::TooShort { length } => Some(format!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"
            )),
            Self::Placeholder { pattern } => {
                Some(format!("appears to be a placeholder (contains '{pattern}')"))
            }
            Self::LowEntropy { bits_per_char } => Some(format!(
                "entropy too low ({bits_per_char:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            )),
        }
    }
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session secret, validated at startup and reserved for cookie signing
    pub session_secret: SecretString,
    /// Debug mode: verbose error pages must never be enabled in production
    pub debug: bool,
    /// Accepted `Host` header values; empty accepts any host
    pub allowed_hosts: Vec<String>,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Directory served under `/media`; product uploads land in `products/`
    pub media_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("session_secret", &"[REDACTED]")
            .field("debug", &self.debug)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("static_dir", &self.static_dir)
            .field("media_dir", &self.media_dir)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        let debug = parse_bool("STOREFRONT_DEBUG", &get_env_or_default("STOREFRONT_DEBUG", "false"))?;
        let allowed_hosts = parse_host_list(&get_env_or_default("STOREFRONT_ALLOWED_HOSTS", ""));
        let static_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATIC_DIR",
            "crates/storefront/static",
        ));
        let media_dir = PathBuf::from(get_env_or_default("STOREFRONT_MEDIA_DIR", "media"));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            debug,
            allowed_hosts,
            static_dir,
            media_dir,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for any other value.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

/// Split a comma-separated host list, dropping blanks and lowercasing.
#[must_use]
pub fn parse_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Parse a Sentry sample rate in `[0, 1]`.
fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let raw = get_env_or_default(key, default);
    let rate = raw
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
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

/// Load a secret from the environment and reject weak values.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    validate_secret(key, get_required_env(key)?)
}

/// Reject a secret that fails [`SecretAssessment`].
fn validate_secret(key: &str, value: String) -> Result<SecretString, ConfigError> {
    if let Some(reason) = SecretAssessment::of(&value).reason() {
        return Err(ConfigError::InsecureSecret(key.to_string(), reason));
    }
    Ok(SecretString::from(value))
}
