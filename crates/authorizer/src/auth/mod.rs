//! Token verification pipeline.
//!
//! # Components
//!
//! - `jwks` - Key provider client: fetches and caches the published key set
//! - `keys` - Key resolver: kid matching and certificate reconstruction
//! - `verifier` - Signature and temporal claim validation
//! - `claims` - Verified claims types

pub mod claims;
pub mod jwks;
pub mod keys;
pub mod verifier;

pub use claims::{Claims, VerifiedIdentity};
pub use jwks::{KeySetClient, SigningKey};
