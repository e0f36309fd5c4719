//! Signature and claims verification.
//!
//! Validates a token against the certificate reconstructed by the key
//! resolver, using the configured algorithm allow-list.
//!
//! # Security
//!
//! - The token's self-declared algorithm is checked against the
//!   allow-list BEFORE any cryptography; a symmetric or "none"
//!   substitution can never reach the verification step
//! - The RSA public key is extracted from the certificate and pinned to
//!   the rsaEncryption OID; anything else is rejected as key material
//! - Signature comparison is constant-time inside the crypto backend
//! - `exp` is strict (zero leeway); the configurable clock skew applies
//!   only to future-dated `iat` claims

use crate::auth::claims::{Claims, VerifiedIdentity};
use crate::errors::AuthError;
use common::jwt::{decode_pem_body, decode_unverified, validate_iat};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;
use x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION;
use x509_parser::prelude::*;

/// Verify a token's signature and temporal claims.
///
/// On success returns a [`VerifiedIdentity`] carrying the subject claim
/// and the full claim set. This function is the only construction site
/// of a `VerifiedIdentity`.
///
/// # Errors
///
/// - `SignatureInvalid` - disallowed or unknown declared algorithm, or
///   a failing signature check
/// - `InvalidKeyMaterial` - the certificate cannot yield an RSA key
/// - `TokenExpired` - `exp` is not strictly in the future, `nbf` is not
///   yet satisfied, or `iat` is too far in the future
/// - `MalformedToken` - claims do not deserialize (e.g. missing `sub`)
pub fn verify(
    token: &str,
    certificate_pem: &str,
    allowed_algorithms: &[Algorithm],
    clock_skew: Duration,
) -> Result<VerifiedIdentity, AuthError> {
    // Pin the declared algorithm to the allow-list before touching any
    // key material. The header is untrusted; an unknown name is treated
    // the same as a disallowed one.
    let (header, _) = decode_unverified(token)?;
    let declared = parse_rs_algorithm(&header.alg);
    let declared = match declared {
        Some(alg) if allowed_algorithms.contains(&alg) => alg,
        _ => {
            tracing::warn!(
                target: "authorizer.verify",
                alg = %header.alg,
                "Token declares an algorithm outside the allow-list"
            );
            return Err(AuthError::SignatureInvalid);
        }
    };

    let decoding_key = decoding_key_from_certificate(certificate_pem)?;

    let mut validation = Validation::new(declared);
    validation.algorithms = allowed_algorithms.to_vec();
    // Strict expiry: exp must be strictly after now.
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // No audience policy; issuer audiences may be strings or arrays and
    // the default validator would reject tokens that carry one.
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "authorizer.verify", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::TokenExpired,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => AuthError::MalformedToken,
            _ => AuthError::SignatureInvalid,
        }
    })?;

    let claims = token_data.claims;

    // jsonwebtoken does not examine iat; apply the clock-skew check here.
    if let Some(iat) = claims.iat {
        validate_iat(iat, clock_skew)?;
    }

    if claims.sub.trim().is_empty() {
        tracing::debug!(target: "authorizer.verify", "Token has an empty subject claim");
        return Err(AuthError::MalformedToken);
    }

    tracing::debug!(target: "authorizer.verify", "Token verified successfully");
    Ok(VerifiedIdentity::new(claims.sub.clone(), claims))
}

/// Map a declared algorithm name onto the RS family.
///
/// Returns `None` for anything else; the caller treats that as a
/// disallowed algorithm.
fn parse_rs_algorithm(name: &str) -> Option<Algorithm> {
    match name {
        "RS256" => Some(Algorithm::RS256),
        "RS384" => Some(Algorithm::RS384),
        "RS512" => Some(Algorithm::RS512),
        _ => None,
    }
}

/// Extract the RSA public key from a PEM certificate.
///
/// The certificate's SubjectPublicKeyInfo must carry the rsaEncryption
/// OID; its bit string is the PKCS#1 public key DER that jsonwebtoken
/// consumes directly.
fn decoding_key_from_certificate(certificate_pem: &str) -> Result<DecodingKey, AuthError> {
    let der = decode_pem_body(certificate_pem).map_err(|e| {
        tracing::warn!(target: "authorizer.verify", error = %e, "Certificate body is not valid base64");
        AuthError::InvalidKeyMaterial("certificate body is not valid base64".to_string())
    })?;

    let (_, certificate) = X509Certificate::from_der(&der).map_err(|e| {
        tracing::warn!(target: "authorizer.verify", error = %e, "Certificate DER parse failed");
        AuthError::InvalidKeyMaterial("certificate is not valid DER".to_string())
    })?;

    let spki = certificate.public_key();
    if spki.algorithm.algorithm != OID_PKCS1_RSAENCRYPTION {
        tracing::warn!(
            target: "authorizer.verify",
            oid = %spki.algorithm.algorithm,
            "Certificate public key is not RSA"
        );
        return Err(AuthError::InvalidKeyMaterial(
            "certificate public key is not RSA".to_string(),
        ));
    }

    Ok(DecodingKey::from_rsa_der(
        spki.subject_public_key.data.as_ref(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use authorizer_test_utils::{
        certificate_pem_fixture, TestTokenBuilder, SECOND_RSA_PRIVATE_KEY_PEM,
        TEST_RSA_PRIVATE_KEY_PEM,
    };
    use common::jwt::DEFAULT_CLOCK_SKEW;

    const RS256_ONLY: &[Algorithm] = &[Algorithm::RS256];

    #[test]
    fn test_verify_valid_token() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .with_kid("K1")
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let identity = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        )
        .unwrap();

        assert_eq!(identity.subject(), "auth0|123");
        assert_eq!(identity.claims().sub, "auth0|123");
    }

    #[test]
    fn test_verify_preserves_custom_claims() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .with_claim("scope", serde_json::json!("read:items"))
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let identity = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        )
        .unwrap();

        assert_eq!(identity.claims().custom["scope"], "read:items");
    }

    #[test]
    fn test_verify_rejects_wrong_signing_key() {
        // Signed by a different keypair than the certificate attests.
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs256(SECOND_RSA_PRIVATE_KEY_PEM);

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        // Replace the payload segment with a different (valid) one.
        let forged_payload = TestTokenBuilder::new()
            .for_subject("auth0|evil")
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged[1];
        let tampered = parts.join(".");

        let result = verify(
            &tampered,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn test_verify_rejects_disallowed_algorithm() {
        // HS256 token whose secret is irrelevant: the declared algorithm
        // is rejected before any cryptography happens.
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_hs256(b"shared-secret");

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn test_verify_rejects_rs384_when_only_rs256_allowed() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs384(TEST_RSA_PRIVATE_KEY_PEM);

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn test_verify_accepts_rs384_when_allowed() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs384(TEST_RSA_PRIVATE_KEY_PEM);

        let identity = verify(
            &token,
            &certificate_pem_fixture(),
            &[Algorithm::RS256, Algorithm::RS384],
            DEFAULT_CLOCK_SKEW,
        )
        .unwrap();
        assert_eq!(identity.subject(), "auth0|123");
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .expires_in(-3600)
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_verify_rejects_future_nbf() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .not_before_in(3600)
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_verify_rejects_far_future_iat() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .issued_in(86400)
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let result = verify(
            &token,
            &certificate_pem_fixture(),
            RS256_ONLY,
            DEFAULT_CLOCK_SKEW,
        );
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_verify_rejects_garbage_certificate() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let pem = "-----BEGIN CERTIFICATE-----\naGVsbG8=\n-----END CERTIFICATE-----";
        let result = verify(&token, pem, RS256_ONLY, DEFAULT_CLOCK_SKEW);
        assert!(matches!(result, Err(AuthError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_verify_rejects_non_base64_certificate() {
        let token = TestTokenBuilder::new()
            .for_subject("auth0|123")
            .sign_rs256(TEST_RSA_PRIVATE_KEY_PEM);

        let pem = "-----BEGIN CERTIFICATE-----\n!!!not-base64!!!\n-----END CERTIFICATE-----";
        let result = verify(&token, pem, RS256_ONLY, DEFAULT_CLOCK_SKEW);
        assert!(matches!(result, Err(AuthError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_parse_rs_algorithm() {
        assert_eq!(parse_rs_algorithm("RS256"), Some(Algorithm::RS256));
        assert_eq!(parse_rs_algorithm("RS384"), Some(Algorithm::RS384));
        assert_eq!(parse_rs_algorithm("RS512"), Some(Algorithm::RS512));
        assert_eq!(parse_rs_algorithm("HS256"), None);
        assert_eq!(parse_rs_algorithm("none"), None);
        assert_eq!(parse_rs_algorithm("rs256"), None);
    }
}
