//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in the infrastructure
//! layer; application-level tests use in-memory doubles.

use chrono::{DateTime, Utc};

use crate::domain::entity::{Session, User};
use crate::domain::value_object::UserId;
use crate::error::SessionResult;

/// User repository trait
///
/// The account service owns user writes; the session core only reads users
/// and records activity.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> SessionResult<Option<User>>;

    /// Record the last authenticated request time (debounced by the caller)
    async fn touch_last_active(&self, user_id: &UserId, at: DateTime<Utc>) -> SessionResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Insert a new session row
    async fn create(&self, session: &Session) -> SessionResult<()>;

    /// Delete every session for the user and insert the replacement,
    /// atomically. Single-session mode depends on this running in one
    /// transaction so concurrent sign-ins cannot both survive.
    async fn replace_for_user(&self, user_id: &UserId, session: &Session) -> SessionResult<()>;

    /// Find the session holding this access-token hash
    async fn find_by_access_hash(&self, hash: &str) -> SessionResult<Option<Session>>;

    /// Find the session holding this refresh-token hash
    async fn find_by_refresh_hash(&self, hash: &str) -> SessionResult<Option<Session>>;

    /// Delete all sessions for a user. Returns the number removed.
    async fn delete_for_user(&self, user_id: &UserId) -> SessionResult<u64>;

    /// Delete the user's sessions whose access or refresh hash matches,
    /// considering only rows that are not already expired. Returns the
    /// number removed.
    async fn delete_by_token_hash(
        &self,
        user_id: &UserId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<u64>;

    /// Remove rows whose access and refresh halves have both expired
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> SessionResult<u64>;
}
