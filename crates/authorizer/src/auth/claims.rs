//! Verified claims types.
//!
//! [`Claims`] is the deserialized claim set of a token; [`VerifiedIdentity`]
//! wraps it together with the subject and can only be constructed by the
//! verifier after a passing signature check. The `sub` field is redacted
//! in Debug output to keep principal identifiers out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token claims, standard and custom.
///
/// `sub` and `exp` are required; everything else the token carries is
/// preserved (custom claims are collected in `custom`). The `sub` field
/// contains a principal identifier and is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Token issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience: a string or an array of strings depending on the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    /// Any remaining custom claims.
    #[serde(flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// An identity attested by a passing signature verification.
///
/// Fields are private on purpose: the only construction site is the
/// verifier, after the signature check against the resolved key has
/// passed. No other code path may build one.
#[derive(Clone)]
pub struct VerifiedIdentity {
    subject: String,
    claims: Claims,
}

impl VerifiedIdentity {
    /// Construct a verified identity. Verifier-internal.
    pub(crate) fn new(subject: String, claims: Claims) -> Self {
        Self { subject, claims }
    }

    /// The verified subject (principal identifier).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The full verified claim set.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

impl fmt::Debug for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedIdentity")
            .field("subject", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> Claims {
        serde_json::from_value(json!({
            "sub": "auth0|123",
            "exp": 1_234_567_890,
            "iat": 1_234_567_800,
            "iss": "https://issuer.example.com/",
            "aud": "https://api.example.com",
            "scope": "read:items"
        }))
        .unwrap()
    }

    #[test]
    fn test_claims_deserialization_keeps_custom_claims() {
        let claims = sample_claims();

        assert_eq!(claims.sub, "auth0|123");
        assert_eq!(claims.exp, 1_234_567_890);
        assert_eq!(claims.iat, Some(1_234_567_800));
        assert!(claims.nbf.is_none());
        assert_eq!(claims.iss.as_deref(), Some("https://issuer.example.com/"));
        assert_eq!(claims.custom["scope"], "read:items");
    }

    #[test]
    fn test_claims_missing_sub_is_an_error() {
        let result: Result<Claims, _> =
            serde_json::from_value(json!({"exp": 1_234_567_890}));
        assert!(result.is_err());
    }

    #[test]
    fn test_claims_missing_exp_is_an_error() {
        let result: Result<Claims, _> = serde_json::from_value(json!({"sub": "auth0|123"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_claims_aud_may_be_an_array() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": "auth0|123",
            "exp": 1,
            "aud": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(claims.aud, Some(json!(["a", "b"])));
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let debug_str = format!("{:?}", sample_claims());

        assert!(
            !debug_str.contains("auth0|123"),
            "Debug output should not contain actual sub value"
        );
        assert!(
            debug_str.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
    }

    #[test]
    fn test_verified_identity_debug_redacts_subject() {
        let identity = VerifiedIdentity::new("auth0|123".to_string(), sample_claims());

        let debug_str = format!("{:?}", identity);
        assert!(!debug_str.contains("auth0|123"));
    }

    #[test]
    fn test_verified_identity_accessors() {
        let identity = VerifiedIdentity::new("auth0|123".to_string(), sample_claims());

        assert_eq!(identity.subject(), "auth0|123");
        assert_eq!(identity.claims().sub, "auth0|123");
    }
}
