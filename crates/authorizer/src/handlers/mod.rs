//! HTTP request handlers.

pub mod authorize;
pub mod health;
