//! Gatehouse Authorizer Service Library
//!
//! A stateless token-based request authorizer. Given a bearer credential
//! attached to an incoming request, it decides ALLOW or DENY for invoking
//! a protected operation:
//!
//! - Fetches and caches the identity provider's published key set (JWKS)
//! - Matches the token's declared key identifier against that set
//! - Reconstructs a verification certificate from the key's `x5c` chain
//! - Validates the RS-family signature and standard temporal claims
//! - Emits a structured Allow/Deny decision document
//!
//! # Architecture
//!
//! ```text
//! routes.rs -> handlers/*.rs -> adapter.rs -> auth/*.rs -> decision.rs
//! ```
//!
//! Every failure in the pipeline is a typed [`errors::AuthError`] and
//! collapses to a Deny decision at the adapter boundary; no fault ever
//! propagates past it (fail-closed).
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Authorization failure taxonomy
//! - `auth` - Key-set client, key resolver, signature verifier
//! - `decision` - Allow/Deny decision document builder
//! - `adapter` - Request boundary: header extraction and orchestration
//! - `handlers` - HTTP request handlers
//! - `routes` - Axum router setup

pub mod adapter;
pub mod auth;
pub mod config;
pub mod decision;
pub mod errors;
pub mod handlers;
pub mod routes;
