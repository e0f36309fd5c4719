//! Authorization failure taxonomy.
//!
//! Every stage of the verification pipeline fails with one of these
//! kinds. All of them are recoverable at the request adapter and map
//! uniformly to a Deny decision; the distinction between kinds exists
//! only for diagnostics and logging, never for caller-visible behavior.

use common::jwt::JwtDecodeError;
use thiserror::Error;

/// Authorization pipeline error.
///
/// The external caller only ever observes Allow or Deny; these variants
/// are logged server-side and never serialized into a response.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential is not a well-formed signed token.
    #[error("Malformed token")]
    MalformedToken,

    /// The identity provider's key set could not be fetched or parsed.
    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(String),

    /// No key (or more than one key) in the set matches the token's
    /// declared key identifier.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The matched key record cannot be turned into a verification key.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Signature verification failed, or the declared algorithm is not
    /// in the configured allow-list.
    #[error("Signature invalid")]
    SignatureInvalid,

    /// A temporal claim check failed (expired, not yet valid, or
    /// issued too far in the future).
    #[error("Token expired")]
    TokenExpired,
}

impl AuthError {
    /// Returns a stable label for this error kind (for structured logs).
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "malformed_token",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::InvalidKeyMaterial(_) => "invalid_key_material",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
        }
    }
}

impl From<JwtDecodeError> for AuthError {
    fn from(e: JwtDecodeError) -> Self {
        match e {
            JwtDecodeError::TokenTooLarge | JwtDecodeError::MalformedToken => {
                AuthError::MalformedToken
            }
            JwtDecodeError::IatTooFarInFuture => AuthError::TokenExpired,
        }
    }
}
