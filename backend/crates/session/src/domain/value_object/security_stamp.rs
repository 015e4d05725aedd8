//! Security Stamp Value Object
//!
//! A per-user value rotated whenever sensitive account properties change
//! (password, role). Tokens embed the stamp at mint time; validation rejects
//! any token whose embedded stamp no longer matches, which invalidates every
//! previously issued token in one write.

use platform::crypto::constant_time_eq;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityStamp(String);

impl SecurityStamp {
    /// Generate a fresh stamp.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a stamp loaded from storage.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a stamp extracted from a token claim.
    pub fn matches(&self, claimed: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), claimed.as_bytes())
    }
}

impl fmt::Display for SecurityStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
