//! User Status Value Object
//!
//! Account status as seen by the session core. The account service owns the
//! full lifecycle; the session core only needs to know whether the account
//! may authenticate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserStatus {
    /// Normal, fully functional account
    #[default]
    Active = 0,
    /// Account is disabled; existing tokens must stop validating
    Disabled = 1,
}

impl UserStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, UserStatus::Active)
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => UserStatus::Active,
            1 => UserStatus::Disabled,
            _ => {
                tracing::error!("Invalid UserStatus id: {}", id);
                unreachable!("Invalid UserStatus id: {}", id)
            }
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => f.write_str("active"),
            UserStatus::Disabled => f.write_str("disabled"),
        }
    }
}
