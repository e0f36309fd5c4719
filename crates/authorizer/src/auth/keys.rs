//! Key resolver: matches a token's declared key identifier against the
//! fetched key set and reconstructs a verification certificate.

use crate::auth::jwks::SigningKey;
use crate::errors::AuthError;

/// Resolve a key record by exact key-identifier equality.
///
/// Zero matches AND more than one match are both failures. Ambiguity is
/// never resolved by taking the first record: silently picking an
/// unintended key would verify a token against material the provider
/// did not pin to that kid.
///
/// # Errors
///
/// Returns `AuthError::KeyNotFound` for zero or multiple matches.
pub fn resolve<'a>(kid: &str, keys: &'a [SigningKey]) -> Result<&'a SigningKey, AuthError> {
    let mut matches = keys.iter().filter(|key| key.kid == kid);

    let resolved = matches.next().ok_or_else(|| {
        tracing::warn!(target: "authorizer.keys", kid = %kid, "No key in set matches token key id");
        AuthError::KeyNotFound(format!("no key in set matches kid '{}'", kid))
    })?;

    if matches.next().is_some() {
        tracing::warn!(target: "authorizer.keys", kid = %kid, "Multiple keys in set match token key id");
        return Err(AuthError::KeyNotFound(format!(
            "key id '{}' is ambiguous in the fetched set",
            kid
        )));
    }

    if resolved.key_use.as_deref().is_some_and(|u| u != "sig") {
        tracing::debug!(
            target: "authorizer.keys",
            kid = %kid,
            key_use = ?resolved.key_use,
            "Resolved key is not marked for signing use"
        );
    }

    Ok(resolved)
}

/// Build a verification-ready certificate string from a key record.
///
/// Wraps the first certificate entry of the `x5c` chain in the standard
/// PEM envelope, base64 body on its own line.
///
/// # Errors
///
/// Returns `AuthError::InvalidKeyMaterial` if the chain is empty.
pub fn certificate_pem(key: &SigningKey) -> Result<String, AuthError> {
    let body = key.x5c.first().ok_or_else(|| {
        tracing::warn!(target: "authorizer.keys", kid = %key.kid, "Key record has an empty certificate chain");
        AuthError::InvalidKeyMaterial(format!("key '{}' has an empty certificate chain", key.kid))
    })?;

    Ok(format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----",
        body
    ))
}
