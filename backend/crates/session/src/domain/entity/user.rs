//! User Entity
//!
//! The session core's view of a user. Account management (sign-up, profile,
//! password) belongs to the account service; this entity carries exactly what
//! token minting and validation need.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{SecurityStamp, UserId, UserRole, UserStatus};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Display / login name, embedded as an identity claim
    pub user_name: String,
    /// Role, embedded as a role claim
    pub user_role: UserRole,
    /// Status (Active, Disabled)
    pub user_status: UserStatus,
    /// Rotated on password/role change; stale tokens carry the old value
    pub security_stamp: SecurityStamp,
    /// Last time an authenticated request was seen (debounced write)
    pub last_active_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(user_name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name: user_name.into(),
            user_role: UserRole::default(),
            user_status: UserStatus::default(),
            security_stamp: SecurityStamp::generate(),
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account may authenticate
    pub fn is_active(&self) -> bool {
        self.user_status.can_login()
    }

    /// Rotate the security stamp, invalidating all previously minted tokens
    pub fn rotate_security_stamp(&mut self) {
        self.security_stamp = SecurityStamp::generate();
        self.updated_at = Utc::now();
    }

    /// Update user role. Rotates the stamp so outstanding tokens lose the
    /// old role claims.
    pub fn set_role(&mut self, role: UserRole) {
        self.user_role = role;
        self.rotate_security_stamp();
    }

    /// Update user status
    pub fn set_status(&mut self, status: UserStatus) {
        self.user_status = status;
        self.updated_at = Utc::now();
    }

    /// Whether `last_active_at` is stale enough to be worth a write.
    pub fn needs_activity_refresh(&self, debounce: Duration, now: DateTime<Utc>) -> bool {
        match self.last_active_at {
            None => true,
            Some(last) => now - last > debounce,
        }
    }
}
