//! JWT utilities shared across Gatehouse components.
//!
//! This module provides the untrusted half of token handling:
//! - Size limits for DoS prevention
//! - Unverified decoding of the header and claims segments
//! - `iat` validation with clock skew tolerance
//! - PEM body decoding for key material
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing in this module validates authenticity; decoded data is
//!   untrusted until a signature check passes downstream
//! - Error messages are intentionally generic to prevent leakage

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical JWTs are 200-500 bytes. Tokens larger than this are rejected
/// before any base64 or JSON work is done, so an oversized credential
/// cannot burn CPU or memory on decode.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes per NIST SP 800-63B).
///
/// Accounts for clock drift between servers. Tokens with `iat` timestamps
/// more than this amount in the future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// Prevents misconfiguration that would weaken security by allowing an
/// excessively large tolerance.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while decoding an untrusted token.
///
/// Display output is identical for every variant on purpose; the
/// distinction exists for logs, never for callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtDecodeError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a well-formed three-segment compact serialization,
    /// or a segment is not valid base64url-encoded JSON.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Unverified token data
// =============================================================================

/// Token header, decoded without signature verification.
///
/// Untrusted: only used to select a verification key and to pin the
/// declared algorithm against an allow-list before any cryptography.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHeader {
    /// Declared signing algorithm (e.g. "RS256"). Untrusted.
    pub alg: String,

    /// Key identifier naming which published key signed this token.
    #[serde(default)]
    pub kid: Option<String>,

    /// Token type, usually "JWT".
    #[serde(default)]
    pub typ: Option<String>,
}

/// Token claims as an untrusted name/value mapping.
///
/// Standard and custom claims alike; nothing here may be attributed to
/// a principal until the signature check passes.
pub type RawClaims = serde_json::Map<String, serde_json::Value>;

/// Decode a token's header and claims WITHOUT verifying the signature.
///
/// This only exposes the metadata needed to pick the right verification
/// key. The token MUST still be verified against that key afterwards.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - not three segments, bad base64url, or a segment
///   that is not a JSON object of the expected shape
pub fn decode_unverified(token: &str) -> Result<(RawHeader, RawClaims), JwtDecodeError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtDecodeError::TokenTooLarge);
    }

    // Compact serialization: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtDecodeError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtDecodeError::MalformedToken)?;
    let claims_part = parts.get(1).ok_or(JwtDecodeError::MalformedToken)?;

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtDecodeError::MalformedToken
    })?;
    let header: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtDecodeError::MalformedToken
    })?;

    let claims_bytes = URL_SAFE_NO_PAD.decode(claims_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
        JwtDecodeError::MalformedToken
    })?;
    let claims: RawClaims = serde_json::from_slice(&claims_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT payload JSON");
        JwtDecodeError::MalformedToken
    })?;

    Ok((header, claims))
}

// =============================================================================
// Temporal validation
// =============================================================================

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// Rejects tokens with `iat` too far in the future, which could indicate
/// token pre-generation, clock synchronization issues, or manipulation.
///
/// # Errors
///
/// Returns `JwtDecodeError::IatTooFarInFuture` if the iat timestamp is
/// more than `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtDecodeError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_iat`] in production code. This variant exists so that
/// boundary conditions can be unit-tested without wall-clock dependence.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtDecodeError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtDecodeError::IatTooFarInFuture);
    }

    Ok(())
}

// =============================================================================
// Key material decoding
// =============================================================================

/// Decode the base64 body of a PEM document.
///
/// Strips the BEGIN/END marker lines and decodes the remaining content
/// with the standard alphabet. Works for certificates and public keys
/// alike; the caller interprets the resulting DER.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the body cannot be decoded.
pub fn decode_pem_body(pem: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let b64: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();

    base64::engine::general_purpose::STANDARD.decode(b64)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_wrap,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_segment(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_default_clock_skew_is_5_minutes() {
        assert_eq!(DEFAULT_CLOCK_SKEW, Duration::from_secs(300));
    }

    #[test]
    fn test_max_clock_skew_is_10_minutes() {
        assert_eq!(MAX_CLOCK_SKEW, Duration::from_secs(600));
    }

    // -------------------------------------------------------------------------
    // decode_unverified Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_unverified_valid_token() {
        let header = encode_segment(&json!({"alg": "RS256", "typ": "JWT", "kid": "key-01"}));
        let claims = encode_segment(&json!({"sub": "auth0|123", "exp": 9_999_999_999_i64}));
        let token = format!("{header}.{claims}.signature");

        let (raw_header, raw_claims) = decode_unverified(&token).unwrap();
        assert_eq!(raw_header.alg, "RS256");
        assert_eq!(raw_header.kid.as_deref(), Some("key-01"));
        assert_eq!(raw_header.typ.as_deref(), Some("JWT"));
        assert_eq!(raw_claims["sub"], "auth0|123");
        assert_eq!(raw_claims["exp"], 9_999_999_999_i64);
    }

    #[test]
    fn test_decode_unverified_missing_kid() {
        let header = encode_segment(&json!({"alg": "RS256", "typ": "JWT"}));
        let claims = encode_segment(&json!({"sub": "u"}));
        let token = format!("{header}.{claims}.sig");

        let (raw_header, _) = decode_unverified(&token).unwrap();
        assert!(raw_header.kid.is_none());
    }

    #[test]
    fn test_decode_unverified_missing_alg_is_malformed() {
        let header = encode_segment(&json!({"typ": "JWT", "kid": "key-01"}));
        let claims = encode_segment(&json!({"sub": "u"}));
        let token = format!("{header}.{claims}.sig");

        assert!(matches!(
            decode_unverified(&token),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_wrong_segment_count() {
        assert!(matches!(
            decode_unverified("not-a-jwt"),
            Err(JwtDecodeError::MalformedToken)
        ));
        assert!(matches!(
            decode_unverified("only.two"),
            Err(JwtDecodeError::MalformedToken)
        ));
        assert!(matches!(
            decode_unverified("a.b.c.d"),
            Err(JwtDecodeError::MalformedToken)
        ));
        assert!(matches!(
            decode_unverified(""),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_empty_segment() {
        assert!(matches!(
            decode_unverified(".payload.signature"),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_invalid_base64() {
        assert!(matches!(
            decode_unverified("!!!invalid!!!.payload.signature"),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_invalid_json() {
        let header_b64 = URL_SAFE_NO_PAD.encode("not-json");
        let claims = encode_segment(&json!({"sub": "u"}));
        let token = format!("{header_b64}.{claims}.sig");

        assert!(matches!(
            decode_unverified(&token),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_claims_not_an_object() {
        let header = encode_segment(&json!({"alg": "RS256"}));
        let claims_b64 = URL_SAFE_NO_PAD.encode("[1,2,3]");
        let token = format!("{header}.{claims_b64}.sig");

        assert!(matches!(
            decode_unverified(&token),
            Err(JwtDecodeError::MalformedToken)
        ));
    }

    #[test]
    fn test_decode_unverified_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert!(matches!(
            decode_unverified(&oversized),
            Err(JwtDecodeError::TokenTooLarge)
        ));
    }

    #[test]
    fn test_decode_unverified_at_size_limit() {
        // A token exactly at the limit is accepted (and then fails on
        // content, not on size).
        let header = encode_segment(&json!({"alg": "RS256", "kid": "key"}));
        let claims = encode_segment(&json!({"sub": "u"}));
        let used = header.len() + claims.len() + 2;
        let token = format!("{header}.{claims}.{}", "s".repeat(MAX_JWT_SIZE_BYTES - used));
        assert_eq!(token.len(), MAX_JWT_SIZE_BYTES);

        assert!(decode_unverified(&token).is_ok());
    }

    // -------------------------------------------------------------------------
    // validate_iat Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_iat_current_time() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_iat(now, DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_validate_iat_past_time() {
        let past = chrono::Utc::now().timestamp() - 3600;
        assert!(validate_iat(past, DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_validate_iat_within_clock_skew() {
        let future = chrono::Utc::now().timestamp() + 200;
        assert!(validate_iat(future, DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_validate_iat_far_future() {
        let far_future = chrono::Utc::now().timestamp() + 86400;
        assert!(matches!(
            validate_iat(far_future, DEFAULT_CLOCK_SKEW),
            Err(JwtDecodeError::IatTooFarInFuture)
        ));
    }

    #[test]
    fn test_validate_iat_at_boundary_exact() {
        let now = 1_700_000_000_i64;

        // iat == now + skew is the last accepted value
        assert!(validate_iat_at(now + 300, DEFAULT_CLOCK_SKEW, now).is_ok());

        // iat == now + skew + 1 is the first rejected value
        assert!(matches!(
            validate_iat_at(now + 301, DEFAULT_CLOCK_SKEW, now),
            Err(JwtDecodeError::IatTooFarInFuture)
        ));
    }

    // -------------------------------------------------------------------------
    // decode_pem_body Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_pem_body_with_markers() {
        let pem = "-----BEGIN CERTIFICATE-----\ndGVzdA==\n-----END CERTIFICATE-----";
        assert_eq!(decode_pem_body(pem).unwrap(), b"test");
    }

    #[test]
    fn test_decode_pem_body_multiline() {
        let pem = "-----BEGIN CERTIFICATE-----\naGVs\nbG8=\n-----END CERTIFICATE-----";
        assert_eq!(decode_pem_body(pem).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_pem_body_without_markers() {
        assert_eq!(decode_pem_body("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_pem_body_invalid_base64() {
        let pem = "-----BEGIN CERTIFICATE-----\n!!!invalid!!!\n-----END CERTIFICATE-----";
        assert!(decode_pem_body(pem).is_err());
    }
}
