//! Authorizer configuration.
//!
//! Configuration is loaded from environment variables; `from_vars`
//! accepts a plain map so tests can construct configurations without
//! touching the process environment.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default key-set cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default outbound HTTP timeout in seconds for key-set fetches.
///
/// A bounded timeout is required: a slow or unresponsive identity
/// provider must never stall the calling system indefinitely.
pub const DEFAULT_JWKS_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default accepted signature algorithm family.
pub const DEFAULT_ALLOWED_ALGORITHMS: &str = "RS256";

/// Authorizer configuration.
///
/// Loaded from environment variables with sensible defaults. The only
/// required variable is `JWKS_URL`, the identity provider's well-known
/// key-set document.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider well-known JWKS URL.
    pub jwks_url: String,

    /// Signature algorithms accepted for token verification.
    ///
    /// Only asymmetric RS-family algorithms can be configured; a token
    /// declaring anything outside this list is rejected regardless of
    /// what the key set says (algorithm-confusion defense).
    pub allowed_algorithms: Vec<Algorithm>,

    /// How long a fetched key set stays cached.
    pub jwks_cache_ttl: Duration,

    /// Outbound HTTP timeout for key-set fetches.
    pub jwks_http_timeout: Duration,

    /// Clock skew tolerance applied to future-dated `iat` claims.
    pub clock_skew: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid allowed algorithm configuration: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid JWKS HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidClockSkew(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required variable is missing or a
    /// value fails validation. Startup fails fast on bad configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Config::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_url = vars
            .get("JWKS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWKS_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let allowed_algorithms = parse_allowed_algorithms(
            vars.get("ALLOWED_ALGORITHMS")
                .map_or(DEFAULT_ALLOWED_ALGORITHMS, String::as_str),
        )?;

        let jwks_cache_ttl = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;
            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECONDS)
        };

        let jwks_http_timeout = if let Some(value_str) = vars.get("JWKS_HTTP_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "JWKS_HTTP_TIMEOUT_SECONDS must be a positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidHttpTimeout(
                    "JWKS_HTTP_TIMEOUT_SECONDS must be positive; an unbounded fetch \
                     would let a stalled provider stall authorization"
                        .to_string(),
                ));
            }
            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_JWKS_HTTP_TIMEOUT_SECONDS)
        };

        let clock_skew = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;
            let skew = Duration::from_secs(value);
            if skew > MAX_CLOCK_SKEW {
                return Err(ConfigError::InvalidClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }
            skew
        } else {
            DEFAULT_CLOCK_SKEW
        };

        Ok(Self {
            bind_address,
            jwks_url,
            allowed_algorithms,
            jwks_cache_ttl,
            jwks_http_timeout,
            clock_skew,
        })
    }
}

/// Parse a comma-separated algorithm allow-list.
///
/// Only the asymmetric RS family is accepted. HMAC names (or anything
/// unknown) are a configuration error, never silently skipped: letting
/// a symmetric algorithm in would allow a token signed with the public
/// certificate bytes to verify.
fn parse_allowed_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let algorithm = match name {
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            other => {
                return Err(ConfigError::InvalidAlgorithm(format!(
                    "'{}' is not an accepted RS-family algorithm",
                    other
                )))
            }
        };
        if !algorithms.contains(&algorithm) {
            algorithms.push(algorithm);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::InvalidAlgorithm(
            "ALLOWED_ALGORITHMS must name at least one algorithm".to_string(),
        ));
    }

    Ok(algorithms)
}
