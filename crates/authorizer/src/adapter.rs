//! Request adapter: the edge between transport and the verification
//! pipeline.
//!
//! Extracts the bearer credential from request headers, drives the
//! pipeline (decode, key fetch, resolve, verify) and collapses the
//! outcome into a [`Decision`]. This is the only layer that sees
//! transport types; everything below works on plain strings and claims.

use crate::auth::verifier;
use crate::auth::{keys, KeySetClient, VerifiedIdentity};
use crate::config::Config;
use crate::decision::Decision;
use crate::errors::AuthError;
use axum::http::{header, HeaderMap};
use common::jwt::decode_unverified;
use jsonwebtoken::Algorithm;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// The authorizer service: one instance serves all requests.
///
/// Holds the key-set client (with its shared cache) and the pinned
/// verification policy. Cloneable via `Arc` into handler state.
pub struct Authorizer {
    key_set_client: Arc<KeySetClient>,
    allowed_algorithms: Vec<Algorithm>,
    clock_skew: Duration,
}

impl Authorizer {
    /// Build an authorizer from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            key_set_client: Arc::new(KeySetClient::with_ttl(
                config.jwks_url.clone(),
                config.jwks_cache_ttl,
                config.jwks_http_timeout,
            )),
            allowed_algorithms: config.allowed_algorithms.clone(),
            clock_skew: config.clock_skew,
        }
    }

    /// Authorize one request from its headers.
    ///
    /// Total: every input produces a decision. Failures are logged with
    /// their kind and collapse to the uniform Deny.
    #[instrument(skip_all)]
    pub async fn authorize(&self, headers: &HeaderMap) -> Decision {
        Decision::from_outcome(self.check(headers).await)
    }

    /// Run the verification pipeline end to end.
    ///
    /// Ordering matters: credential extraction and the unverified decode
    /// happen before any network traffic, so a request without a usable
    /// bearer token never costs a key-set fetch.
    async fn check(&self, headers: &HeaderMap) -> Result<VerifiedIdentity, AuthError> {
        let token = extract_bearer(headers)?;

        let (header, _) = decode_unverified(token)?;
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| {
                tracing::debug!(target: "authorizer.adapter", "Token header carries no key id");
                AuthError::KeyNotFound("token header carries no kid".to_string())
            })?;

        let key_set = self.key_set_client.key_set().await?;
        let key = keys::resolve(&kid, &key_set)?;
        let certificate = keys::certificate_pem(key)?;

        verifier::verify(
            token,
            &certificate,
            &self.allowed_algorithms,
            self.clock_skew,
        )
    }
}

/// Extract the bearer token from the Authorization header.
///
/// The scheme comparison is case-insensitive ("bearer", "Bearer",
/// "BEARER" all match); the token itself is returned verbatim.
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` when the header is missing, not
/// valid ASCII, uses another scheme, or carries an empty token.
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        tracing::debug!(target: "authorizer.adapter", "Request has no authorization header");
        AuthError::MalformedToken
    })?;

    let value = value.to_str().map_err(|_| {
        tracing::debug!(target: "authorizer.adapter", "Authorization header is not valid ASCII");
        AuthError::MalformedToken
    })?;

    let (scheme, token) = value.split_once(' ').ok_or_else(|| {
        tracing::debug!(target: "authorizer.adapter", "Authorization header has no scheme separator");
        AuthError::MalformedToken
    })?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "authorizer.adapter", "Authorization scheme is not Bearer");
        return Err(AuthError::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        tracing::debug!(target: "authorizer.adapter", "Bearer token is empty");
        return Err(AuthError::MalformedToken);
    }

    Ok(token)
}
