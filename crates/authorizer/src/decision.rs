//! Authorization decision documents.
//!
//! The outcome of every authorization call is a [`Decision`]: either an
//! Allow carrying the verified principal or a Deny carrying the
//! anonymous placeholder. Every failure collapses to the same Deny
//! document; the reason is logged, never serialized.

use crate::auth::VerifiedIdentity;
use crate::errors::AuthError;
use serde::{Deserialize, Serialize};

/// The single action this service authorizes.
pub const ACTION_INVOKE: &str = "invoke";

/// Wildcard resource scope.
pub const RESOURCE_ANY: &str = "*";

/// Principal recorded on denials. A Deny never reveals whether a
/// principal was recognized.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Decision effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// The request may proceed.
    Allow,
    /// The request must be refused.
    Deny,
}

/// A complete authorization decision document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// The principal the decision applies to.
    pub principal_id: String,

    /// Allow or Deny.
    pub effect: Effect,

    /// The permitted or refused action.
    pub action: String,

    /// The resource scope the decision covers.
    pub resource: String,
}

impl Decision {
    /// Build an Allow decision for a verified principal.
    pub fn allow(principal_id: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            effect: Effect::Allow,
            action: ACTION_INVOKE.to_string(),
            resource: RESOURCE_ANY.to_string(),
        }
    }

    /// Build the uniform Deny decision.
    pub fn deny() -> Self {
        Self {
            principal_id: ANONYMOUS_PRINCIPAL.to_string(),
            effect: Effect::Deny,
            action: ACTION_INVOKE.to_string(),
            resource: RESOURCE_ANY.to_string(),
        }
    }

    /// Collapse a verification outcome into a decision.
    ///
    /// This is the only place failures are normalized: the error kind is
    /// logged for operators and then discarded, so the serialized Deny
    /// carries nothing an attacker can use to probe the pipeline.
    pub fn from_outcome(outcome: Result<VerifiedIdentity, AuthError>) -> Self {
        match outcome {
            Ok(identity) => {
                tracing::info!(target: "authorizer.decision", "Request authorized");
                Self::allow(identity.subject())
            }
            Err(e) => {
                tracing::info!(
                    target: "authorizer.decision",
                    kind = e.kind(),
                    "Request denied"
                );
                Self::deny()
            }
        }
    }
}
