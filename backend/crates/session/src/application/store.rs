//! Session Store
//!
//! Persistence facade over the session repository. Raw tokens never reach
//! the repository: every lookup and delete goes through a SHA-256 digest, so
//! a database dump cannot be replayed as credentials.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::crypto::token_hash;

use crate::application::codec::SessionInfo;
use crate::application::config::SessionConfig;
use crate::domain::entity::{Session, User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::UserId;
use crate::error::SessionResult;

/// Registry of live sessions, keyed by token digest.
pub struct SessionStore<R> {
    repo: Arc<R>,
    config: Arc<SessionConfig>,
}

impl<R> Clone for SessionStore<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> SessionStore<R>
where
    R: SessionRepository + UserRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self { repo, config }
    }

    /// Register a freshly minted token pair for `user_id`.
    ///
    /// In single-session mode this atomically replaces every existing
    /// session of the user, so two concurrent sign-ins cannot both survive.
    pub async fn add_session(&self, user_id: UserId, info: &SessionInfo) -> SessionResult<()> {
        let session = Session::new(
            user_id,
            token_hash(&info.access_token),
            token_hash(&info.refresh_token),
            info.access_expires_at,
            info.refresh_expires_at,
        );

        if self.config.allow_multiple_sessions {
            self.repo.create(&session).await?;
        } else {
            self.repo.replace_for_user(&user_id, &session).await?;
        }

        tracing::info!(
            user_id = %user_id,
            session_id = %session.session_id,
            "Session registered"
        );
        Ok(())
    }

    /// Remove the session that `raw_token` (access or refresh) belongs to.
    ///
    /// In single-session mode every session of the user goes, mirroring the
    /// exclusivity rule on the way out. Idempotent: removing a session that
    /// is already gone is not an error.
    pub async fn remove_session(&self, user_id: UserId, raw_token: &str) -> SessionResult<u64> {
        let removed = if self.config.allow_multiple_sessions {
            self.repo
                .delete_by_token_hash(&user_id, &token_hash(raw_token), Utc::now())
                .await?
        } else {
            self.repo.delete_for_user(&user_id).await?
        };

        if removed > 0 {
            tracing::info!(user_id = %user_id, removed, "Session removed");
        }
        Ok(removed)
    }

    /// Remove every session of the user, regardless of mode.
    pub async fn revoke_all(&self, user_id: UserId) -> SessionResult<u64> {
        let removed = self.repo.delete_for_user(&user_id).await?;
        tracing::info!(user_id = %user_id, removed, "All sessions revoked");
        Ok(removed)
    }

    /// Resolve the owner of a registered, unexpired access token.
    pub async fn find_user_by_access_token(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<User>> {
        let Some(session) = self
            .repo
            .find_by_access_hash(&token_hash(raw_token))
            .await?
        else {
            return Ok(None);
        };
        if session.access_expired(now) {
            return Ok(None);
        }
        self.repo.find_by_id(&session.user_id).await
    }

    /// Resolve the owner of a registered, unexpired refresh token.
    pub async fn find_user_by_refresh_token(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<User>> {
        let Some(session) = self
            .repo
            .find_by_refresh_hash(&token_hash(raw_token))
            .await?
        else {
            return Ok(None);
        };
        if session.refresh_expired(now) {
            return Ok(None);
        }
        self.repo.find_by_id(&session.user_id).await
    }

    /// Whether this exact access token is registered for `user_id` and not
    /// yet expired. A signature-valid token whose session was revoked fails
    /// here.
    pub async fn is_access_token_registered(
        &self,
        user_id: &UserId,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<bool> {
        let Some(session) = self
            .repo
            .find_by_access_hash(&token_hash(raw_token))
            .await?
        else {
            return Ok(false);
        };
        Ok(&session.user_id == user_id && !session.access_expired(now))
    }

    /// Purge rows whose access and refresh halves have both expired.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> SessionResult<u64> {
        let removed = self.repo.cleanup_expired(now).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired sessions purged");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::codec::TokenCodec;
    use crate::application::testing::InMemoryRepo;
    use platform::client::{DeviceFingerprint, RequestContext};

    fn test_ctx() -> RequestContext {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0";
        let ip = "203.0.113.7".parse().unwrap();
        RequestContext {
            user_agent: Some(ua.to_string()),
            ip_address: Some(ip),
            device_id: DeviceFingerprint::compute(Some(ua), Some(ip)),
            issuer: None,
            audience: None,
            user_id: None,
        }
    }

    fn fixture(allow_multiple: bool) -> (SessionStore<InMemoryRepo>, TokenCodec, InMemoryRepo) {
        let mut config = SessionConfig::with_secret("store-test-secret");
        config.allow_multiple_sessions = allow_multiple;
        let config = Arc::new(config);
        let repo = InMemoryRepo::new();
        (
            SessionStore::new(Arc::new(repo.clone()), Arc::clone(&config)),
            TokenCodec::new(config),
            repo,
        )
    }

    fn mint(codec: &TokenCodec, user: &User) -> SessionInfo {
        codec.mint_session(user, &test_ctx(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_single_session_mode_keeps_one_session() {
        let (store, codec, repo) = fixture(false);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        let first = mint(&codec, &user);
        let second = mint(&codec, &user);
        store.add_session(user.user_id, &first).await.unwrap();
        store.add_session(user.user_id, &second).await.unwrap();

        assert_eq!(repo.session_count(), 1);

        // The replaced pair no longer resolves; the replacement does.
        let now = Utc::now();
        assert!(store
            .find_user_by_access_token(&first.access_token, now)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_user_by_access_token(&second.access_token, now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_multi_session_mode_sessions_are_independent() {
        let (store, codec, repo) = fixture(true);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        let desktop = mint(&codec, &user);
        let laptop = mint(&codec, &user);
        store.add_session(user.user_id, &desktop).await.unwrap();
        store.add_session(user.user_id, &laptop).await.unwrap();
        assert_eq!(repo.session_count(), 2);

        // Removing one leaves the other authenticating.
        let removed = store
            .remove_session(user.user_id, &desktop.access_token)
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let now = Utc::now();
        assert!(store
            .find_user_by_access_token(&desktop.access_token, now)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_user_by_access_token(&laptop.access_token, now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_remove_session_is_idempotent() {
        let (store, codec, repo) = fixture(true);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        let info = mint(&codec, &user);
        store.add_session(user.user_id, &info).await.unwrap();

        assert_eq!(
            store
                .remove_session(user.user_id, &info.access_token)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .remove_session(user.user_id, &info.access_token)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_revoke_all_clears_every_session() {
        let (store, codec, repo) = fixture(true);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        for _ in 0..3 {
            store
                .add_session(user.user_id, &mint(&codec, &user))
                .await
                .unwrap();
        }
        assert_eq!(store.revoke_all(user.user_id).await.unwrap(), 3);
        assert_eq!(repo.session_count(), 0);
    }

    #[tokio::test]
    async fn test_registered_check_rejects_foreign_and_unknown_tokens() {
        let (store, codec, repo) = fixture(true);
        let ada = User::new("ada");
        let bob = User::new("bob");
        repo.insert_user(ada.clone());
        repo.insert_user(bob.clone());

        let info = mint(&codec, &ada);
        store.add_session(ada.user_id, &info).await.unwrap();

        let now = Utc::now();
        assert!(store
            .is_access_token_registered(&ada.user_id, &info.access_token, now)
            .await
            .unwrap());
        // Same token checked against another user fails.
        assert!(!store
            .is_access_token_registered(&bob.user_id, &info.access_token, now)
            .await
            .unwrap());
        // A token that was never stored fails.
        assert!(!store
            .is_access_token_registered(&ada.user_id, "never-stored", now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_expired_access_half_stops_resolving() {
        let (store, codec, repo) = fixture(true);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        let info = mint(&codec, &user);
        store.add_session(user.user_id, &info).await.unwrap();

        let after_access_expiry = info.access_expires_at + chrono::Duration::seconds(1);
        assert!(store
            .find_user_by_access_token(&info.access_token, after_access_expiry)
            .await
            .unwrap()
            .is_none());
        // The refresh half outlives the access half.
        assert!(store
            .find_user_by_refresh_token(&info.refresh_token, after_access_expiry)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_fully_expired_rows() {
        let (store, codec, repo) = fixture(true);
        let user = User::new("ada");
        repo.insert_user(user.clone());

        let live = mint(&codec, &user);
        store.add_session(user.user_id, &live).await.unwrap();

        let dead = codec
            .mint_session(&user, &test_ctx(), Utc::now() - chrono::Duration::days(120))
            .unwrap();
        store.add_session(user.user_id, &dead).await.unwrap();

        assert_eq!(store.cleanup_expired(Utc::now()).await.unwrap(), 1);
        assert_eq!(repo.session_count(), 1);
    }
}
