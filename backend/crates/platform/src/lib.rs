//! Platform - HTTP-facing primitives shared by backend modules
//!
//! Small, dependency-light building blocks:
//! - `crypto` - one-way digests and encodings
//! - `user_agent` - deterministic user-agent classification
//! - `client` - client IP normalization, device fingerprints, request context

pub mod client;
pub mod crypto;
pub mod user_agent;
