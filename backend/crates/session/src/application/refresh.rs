//! Session Refresh
//!
//! Exchanges a live refresh token for a brand-new token pair. The presented
//! pair is retired in the same call, so a refresh token is single-use.

use std::sync::Arc;

use chrono::Utc;
use platform::client::RequestContext;

use crate::application::codec::{SessionInfo, TokenCodec};
use crate::application::config::SessionConfig;
use crate::application::store::SessionStore;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{SessionError, SessionResult};

/// Refresh use case.
pub struct RefreshSession<R> {
    codec: TokenCodec,
    store: SessionStore<R>,
}

impl<R> Clone for RefreshSession<R> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            store: self.store.clone(),
        }
    }
}

impl<R> RefreshSession<R>
where
    R: SessionRepository + UserRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self {
            codec: TokenCodec::new(Arc::clone(&config)),
            store: SessionStore::new(repo, config),
        }
    }

    /// Rotate `refresh_token` into a new pair for the same user and device.
    pub async fn execute(
        &self,
        refresh_token: &str,
        ctx: &RequestContext,
    ) -> SessionResult<SessionInfo> {
        let claims = self
            .codec
            .verify_refresh(refresh_token, ctx)
            .map_err(SessionError::from)?;

        let now = Utc::now();
        let owner = self
            .store
            .find_user_by_refresh_token(refresh_token, now)
            .await?
            .ok_or(SessionError::SessionInvalid)?;

        // The registered session must belong to the token's subject.
        if owner.user_id.to_string() != claims.sub {
            tracing::warn!(
                user_id = %owner.user_id,
                sub = %claims.sub,
                "Refresh token subject does not match the session owner"
            );
            return Err(SessionError::SessionInvalid);
        }

        if !owner.is_active() {
            return Err(SessionError::AccountInactive);
        }

        let info = self.codec.mint_session(&owner, ctx, now)?;

        // Retire the presented pair before registering its replacement.
        self.store
            .remove_session(owner.user_id, refresh_token)
            .await?;
        self.store.add_session(owner.user_id, &info).await?;

        tracing::info!(user_id = %owner.user_id, "Session refreshed");
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::InMemoryRepo;
    use crate::domain::entity::User;
    use crate::domain::value_object::UserStatus;
    use platform::client::DeviceFingerprint;

    const UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15";

    fn ctx_for(user_agent: &str) -> RequestContext {
        let ip = "192.0.2.200".parse().unwrap();
        RequestContext {
            user_agent: Some(user_agent.to_string()),
            ip_address: Some(ip),
            device_id: DeviceFingerprint::compute(Some(user_agent), Some(ip)),
            issuer: None,
            audience: None,
            user_id: None,
        }
    }

    struct Fixture {
        refresh: RefreshSession<InMemoryRepo>,
        store: SessionStore<InMemoryRepo>,
        codec: TokenCodec,
        repo: InMemoryRepo,
        ctx: RequestContext,
    }

    fn fixture() -> Fixture {
        let config = Arc::new(SessionConfig::with_secret("refresh-test-secret"));
        let repo = InMemoryRepo::new();
        let arc_repo = Arc::new(repo.clone());
        Fixture {
            refresh: RefreshSession::new(Arc::clone(&arc_repo), Arc::clone(&config)),
            store: SessionStore::new(arc_repo, Arc::clone(&config)),
            codec: TokenCodec::new(config),
            repo,
            ctx: ctx_for(UA),
        }
    }

    async fn signed_in_user(f: &Fixture) -> (User, SessionInfo) {
        let user = User::new("ada");
        f.repo.insert_user(user.clone());
        let info = f.codec.mint_session(&user, &f.ctx, Utc::now()).unwrap();
        f.store.add_session(user.user_id, &info).await.unwrap();
        (user, info)
    }

    #[tokio::test]
    async fn test_refresh_rotates_the_pair() {
        let f = fixture();
        let (user, old) = signed_in_user(&f).await;

        let new = f.refresh.execute(&old.refresh_token, &f.ctx).await.unwrap();
        assert_ne!(new.access_token, old.access_token);
        assert_ne!(new.refresh_token, old.refresh_token);
        assert_eq!(new.claims.sub, user.user_id.to_string());
        assert_eq!(f.repo.session_count(), 1);

        // The old pair is retired; the new one resolves.
        let now = Utc::now();
        assert!(f
            .store
            .find_user_by_refresh_token(&old.refresh_token, now)
            .await
            .unwrap()
            .is_none());
        assert!(f
            .store
            .find_user_by_access_token(&new.access_token, now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let f = fixture();
        let (_, old) = signed_in_user(&f).await;

        f.refresh.execute(&old.refresh_token, &f.ctx).await.unwrap();
        assert!(matches!(
            f.refresh.execute(&old.refresh_token, &f.ctx).await,
            Err(SessionError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_fails() {
        let f = fixture();
        let (user, info) = signed_in_user(&f).await;
        f.store.revoke_all(user.user_id).await.unwrap();

        assert!(matches!(
            f.refresh.execute(&info.refresh_token, &f.ctx).await,
            Err(SessionError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_disabled_account_cannot_refresh() {
        let f = fixture();
        let (mut user, info) = signed_in_user(&f).await;
        user.set_status(UserStatus::Disabled);
        f.repo.update_user(user);

        assert!(matches!(
            f.refresh.execute(&info.refresh_token, &f.ctx).await,
            Err(SessionError::AccountInactive)
        ));
    }

    #[tokio::test]
    async fn test_refresh_from_another_device_fails() {
        let f = fixture();
        let (_, info) = signed_in_user(&f).await;

        let other = ctx_for("Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0.0.0 Mobile Safari/537.36");
        assert!(matches!(
            f.refresh.execute(&info.refresh_token, &other).await,
            Err(SessionError::DeviceMismatch)
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_token_fails() {
        let f = fixture();
        let user = User::new("ada");
        f.repo.insert_user(user.clone());
        let info = f
            .codec
            .mint_session(&user, &f.ctx, Utc::now() - chrono::Duration::days(120))
            .unwrap();
        f.store.add_session(user.user_id, &info).await.unwrap();

        assert!(matches!(
            f.refresh.execute(&info.refresh_token, &f.ctx).await,
            Err(SessionError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let f = fixture();
        let (_, info) = signed_in_user(&f).await;

        assert!(matches!(
            f.refresh.execute(&info.access_token, &f.ctx).await,
            Err(SessionError::TokenRejected)
        ));
    }
}
