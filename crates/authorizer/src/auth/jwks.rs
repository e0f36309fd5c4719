//! Key provider client: fetches and caches the identity provider's
//! published public-key set.
//!
//! The client fetches the provider's `/.well-known/jwks.json` document
//! and caches the parsed key records with a configurable TTL.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the provider and improve latency
//! - Cache expires on TTL to pick up key rotations
//! - The outbound fetch carries a bounded timeout; a stalled provider
//!   surfaces as `KeySetUnavailable` instead of hanging the caller
//! - Concurrent refreshes are idempotent: the cached set is replaced by
//!   atomic swap, and racing fetches of the same document are benign

use crate::errors::AuthError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default outbound HTTP timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// A published signing key record from the key-set document.
///
/// Immutable once fetched. Only `kid` and `x5c` are needed to build a
/// verification certificate; the remaining fields are carried for
/// diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningKey {
    /// Key type (e.g. "RSA").
    #[serde(default)]
    pub kty: Option<String>,

    /// Key ID - matched against the token header's declared key id.
    pub kid: String,

    /// Key use (should be "sig" for signing keys).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Algorithm the provider associates with this key.
    #[serde(default)]
    pub alg: Option<String>,

    /// Certificate chain: ordered base64 DER certificate blobs.
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// Key-set response from the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySetResponse {
    /// List of published signing keys.
    pub keys: Vec<SigningKey>,
}

/// Cached key set with expiry time.
struct CachedKeySet {
    /// The fetched records, shared copy-on-write with readers.
    keys: Arc<[SigningKey]>,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// Client for fetching and caching the provider's key set.
///
/// Thread-safe: multiple simultaneous authorization calls may read the
/// cached set concurrently while a refresh swaps in a new one.
pub struct KeySetClient {
    /// URL of the well-known key-set document.
    jwks_url: String,

    /// HTTP client for fetching the document.
    http_client: reqwest::Client,

    /// Cached key set.
    cache: RwLock<Option<CachedKeySet>>,

    /// Cache TTL duration.
    cache_ttl: Duration,
}

impl KeySetClient {
    /// Create a new client with default TTL and timeout.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(
            jwks_url,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        )
    }

    /// Create a new client with explicit cache TTL and fetch timeout.
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration, http_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authorizer.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            cache_ttl,
        }
    }

    /// Get the current key set, fetching from the provider if the cache
    /// is empty or expired.
    ///
    /// Returns the whole set: key-id matching (including the ambiguity
    /// check) belongs to the resolver, not to this client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if the document cannot be
    /// fetched or parsed.
    #[instrument(skip(self))]
    pub async fn key_set(&self) -> Result<Arc<[SigningKey]>, AuthError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    tracing::debug!(target: "authorizer.jwks", "Key set cache hit");
                    return Ok(Arc::clone(&cached.keys));
                }
            }
        }

        // Cache miss or expired - fetch a fresh set
        self.refresh_cache().await?;

        let cache = self.cache.read().await;
        if let Some(cached) = cache.as_ref() {
            return Ok(Arc::clone(&cached.keys));
        }

        // Unreachable in practice: refresh either errored or populated
        // the cache. Kept fail-closed regardless.
        Err(AuthError::KeySetUnavailable(
            "key set cache empty after refresh".to_string(),
        ))
    }

    /// Refresh the cache by fetching the key-set document.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), AuthError> {
        tracing::debug!(target: "authorizer.jwks", url = %self.jwks_url, "Fetching key set from provider");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "authorizer.jwks", error = %e, "Failed to fetch key set");
                AuthError::KeySetUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "authorizer.jwks",
                status = %response.status(),
                "Key set endpoint returned error"
            );
            return Err(AuthError::KeySetUnavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let key_set: KeySetResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "authorizer.jwks", error = %e, "Failed to parse key set response");
            AuthError::KeySetUnavailable(e.to_string())
        })?;

        let keys: Arc<[SigningKey]> = key_set.keys.into();

        tracing::info!(
            target: "authorizer.jwks",
            key_count = keys.len(),
            "Key set cache refreshed"
        );

        // Atomic swap: readers holding the previous Arc are unaffected
        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeySet {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        Ok(())
    }

    /// Force refresh the cache.
    ///
    /// Useful for manual cache invalidation.
    pub async fn force_refresh(&self) -> Result<(), AuthError> {
        self.refresh_cache().await
    }
}
