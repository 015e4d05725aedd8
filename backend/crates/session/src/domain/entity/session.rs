//! Session Entity
//!
//! One persisted access/refresh token pair. Only one-way digests of the raw
//! tokens are stored; the raw strings exist solely in the response that
//! delivered them to the client.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_object::UserId;

/// Persisted session row
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4)
    pub session_id: Uuid,
    /// Owning user
    pub user_id: UserId,
    /// SHA-256 hex digest of the raw access token
    pub access_token_hash: String,
    /// SHA-256 hex digest of the raw refresh token
    pub refresh_token_hash: String,
    /// Access token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: UserId,
        access_token_hash: String,
        refresh_token_hash: String,
        access_expires_at: DateTime<Utc>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            access_token_hash,
            refresh_token_hash,
            access_expires_at,
            refresh_expires_at,
            created_at: Utc::now(),
        }
    }

    /// The access half can no longer authenticate requests
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at <= now
    }

    /// The refresh half can no longer mint a replacement pair
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires_at <= now
    }

    /// Both halves are dead; the row is garbage
    pub fn fully_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expired(now) && self.refresh_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_at(now: DateTime<Utc>, access_ttl: Duration, refresh_ttl: Duration) -> Session {
        Session::new(
            UserId::new(),
            "access-hash".to_string(),
            "refresh-hash".to_string(),
            now + access_ttl,
            now + refresh_ttl,
        )
    }

    #[test]
    fn test_expiry_boundaries() {
        let now = Utc::now();
        let session = session_at(now, Duration::seconds(1), Duration::days(90));

        assert!(!session.access_expired(now));
        assert!(session.access_expired(now + Duration::seconds(1)));
        assert!(!session.refresh_expired(now + Duration::days(89)));
        assert!(session.refresh_expired(now + Duration::days(90)));
    }

    #[test]
    fn test_fully_expired_requires_both() {
        let now = Utc::now();
        let session = session_at(now, Duration::hours(1), Duration::days(1));

        assert!(!session.fully_expired(now + Duration::hours(2)));
        assert!(session.fully_expired(now + Duration::days(2)));
    }
}
