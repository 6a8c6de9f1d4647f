//! Proxy configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROXY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `PROXY_BASE_URL` - Public URL of this service (used for OAuth redirects)
//! - `SHOPIFY_API_KEY` - App client id
//! - `SHOPIFY_API_SECRET` - App client secret; signs app proxy requests and
//!   OAuth callbacks (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `PROXY_HOST` - Bind address (default: 127.0.0.1)
//! - `PROXY_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2025-01)
//! - `SHOPIFY_SCOPES` - Comma separated OAuth scopes
//!   (default: `read_customers,write_customers,read_companies,write_companies`)
//! - `SHOPIFY_HTTP_TIMEOUT_SECS` - Admin API request timeout (default: 30)
//! - `SHOPIFY_REQUIRE_SIGNATURE` - Only accept signed app proxy requests (default: false)
//! - `WHOLESALE_DEFAULT_COUNTRY` - Country code for addresses without one (default: US)
//! - `WHOLESALE_CUSTOMER_TAG` - Tag applied to registered customers (default: wholesale)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for structured logs (also implied by `FLY_APP_NAME`)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::registration::{DEFAULT_COMPANY_SCAN_LIMIT, WorkflowSettings};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_SCOPES: &str = "read_customers,write_customers,read_companies,write_companies";

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

/// Proxy application configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this service
    pub base_url: String,
    /// Shopify app configuration
    pub shopify: ShopifyAppConfig,
    /// Registration workflow settings
    pub workflow: WorkflowSettings,
    /// Emit JSON logs
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client id
    pub api_key: String,
    /// App client secret (HIGH PRIVILEGE)
    pub api_secret: SecretString,
    /// Admin API version (e.g., 2025-01)
    pub api_version: String,
    /// OAuth scopes requested at install
    pub scopes: Vec<String>,
    /// Admin API request timeout
    pub http_timeout: Duration,
    /// Reject app proxy requests without a valid signature
    pub require_signature: bool,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("scopes", &self.scopes)
            .field("http_timeout", &self.http_timeout)
            .field("require_signature", &self.require_signature)
            .finish()
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PROXY_DATABASE_URL")?;
        let host = get_env_or_default("PROXY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PROXY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("PROXY_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_BASE_URL".to_string(), e.to_string()))?;

        let shopify = ShopifyAppConfig::from_env()?;
        let workflow = workflow_from_env();
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"))
            || get_optional_env("FLY_APP_NAME").is_some();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shopify,
            workflow,
            json_logs,
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

    /// OAuth redirect target registered with Shopify.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let http_timeout = get_env_or_default("SHOPIFY_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPIFY_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            scopes: parse_scopes(&get_env_or_default("SHOPIFY_SCOPES", DEFAULT_SCOPES)),
            http_timeout: Duration::from_secs(http_timeout),
            require_signature: parse_bool(get_optional_env("SHOPIFY_REQUIRE_SIGNATURE").as_deref()),
        })
    }
}

fn workflow_from_env() -> WorkflowSettings {
    WorkflowSettings {
        customer_tag: get_env_or_default("WHOLESALE_CUSTOMER_TAG", "wholesale"),
        default_country: get_env_or_default("WHOLESALE_DEFAULT_COUNTRY", "US").to_uppercase(),
        company_scan_limit: DEFAULT_COMPANY_SCAN_LIMIT,
    }
}

/// Configuration for offline tools (the CLI).
///
/// Unlike [`ProxyConfig`] this needs no app credentials: tools act with a
/// shop's stored session.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Admin API version
    pub api_version: String,
    /// Admin API request timeout
    pub http_timeout: Duration,
    /// Registration workflow settings
    pub workflow: WorkflowSettings,
}

impl ToolConfig {
    /// Load tool configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or the timeout
    /// is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let http_timeout = get_env_or_default("SHOPIFY_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPIFY_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url: get_database_url("PROXY_DATABASE_URL")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            http_timeout: Duration::from_secs(http_timeout),
            workflow: workflow_from_env(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
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
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn parse_scopes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
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
    let len = s.len() as f64;
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

    // Real client secrets are random hex or base62
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
