//! Common utilities shared across Gatehouse components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (unverified decoding, temporal checks, constants)
pub mod jwt;
