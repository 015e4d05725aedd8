//! Session Validation
//!
//! Per-request access-token validation. The outcome is a [`TokenVerdict`],
//! never an error: infrastructure failures during validation collapse into
//! a rejecting verdict (logged), so a database hiccup can deny a request but
//! can never crash the pipeline or accidentally let one through.

use std::sync::Arc;

use chrono::Utc;
use platform::client::RequestContext;
use uuid::Uuid;

use crate::application::codec::{AccessClaims, TokenCodec, TokenRejection};
use crate::application::config::SessionConfig;
use crate::application::store::SessionStore;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::UserId;

/// Outcome of validating a presented token.
#[derive(Debug)]
pub enum TokenVerdict {
    /// Token is good; carries the verified claims
    Valid(Box<AccessClaims>),
    /// Unparsable, bad signature, or wrong issuer/audience
    Malformed,
    /// Past its expiry
    Expired,
    /// Minted for a different device fingerprint
    DeviceMismatch,
    /// Subject no longer resolves to a user
    UnknownUser,
    /// Security stamp changed since mint (password or role change)
    StaleCredentials,
    /// The account is not allowed to authenticate
    InactiveAccount,
    /// Signature-valid but no live session registers this token
    Revoked,
}

impl TokenVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenVerdict::Valid(_))
    }
}

impl From<TokenRejection> for TokenVerdict {
    fn from(rejection: TokenRejection) -> Self {
        match rejection {
            TokenRejection::Malformed => TokenVerdict::Malformed,
            TokenRejection::Expired => TokenVerdict::Expired,
            TokenRejection::DeviceMismatch => TokenVerdict::DeviceMismatch,
        }
    }
}

/// Validates presented tokens against signature, identity, and the session
/// registry.
pub struct SessionValidator<R> {
    codec: TokenCodec,
    store: SessionStore<R>,
    repo: Arc<R>,
    config: Arc<SessionConfig>,
}

impl<R> Clone for SessionValidator<R> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            store: self.store.clone(),
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> SessionValidator<R>
where
    R: SessionRepository + UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self {
            codec: TokenCodec::new(Arc::clone(&config)),
            store: SessionStore::new(Arc::clone(&repo), Arc::clone(&config)),
            repo,
            config,
        }
    }

    /// Full validation of an access token presented by a request.
    ///
    /// Checks, in order: signature/issuer/audience/expiry, device binding,
    /// subject resolution, security stamp, account status, and session
    /// registration. Cheapest and most common rejections come first.
    pub async fn execute(&self, token: &str, ctx: &RequestContext) -> TokenVerdict {
        let claims = match self.codec.verify_access(token, ctx) {
            Ok(claims) => claims,
            Err(rejection) => return rejection.into(),
        };

        let user_id = match Uuid::parse_str(&claims.sub) {
            Ok(uuid) => UserId::from_uuid(uuid),
            Err(_) => {
                tracing::error!(sub = %claims.sub, "Token subject is not a UUID");
                return TokenVerdict::Malformed;
            }
        };

        let user = match self.repo.find_by_id(&user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "Token subject no longer exists");
                return TokenVerdict::UnknownUser;
            }
            Err(e) => {
                tracing::error!(error = %e, token = %token, "User lookup failed during validation");
                return TokenVerdict::UnknownUser;
            }
        };

        if !user.security_stamp.matches(&claims.sst) {
            tracing::warn!(user_id = %user_id, "Token rejected after credential change");
            return TokenVerdict::StaleCredentials;
        }

        if !user.is_active() {
            tracing::warn!(user_id = %user_id, "Inactive account presented a valid token");
            return TokenVerdict::InactiveAccount;
        }

        let now = Utc::now();
        match self
            .store
            .is_access_token_registered(&user_id, token, now)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %user_id, "Token has no live session");
                return TokenVerdict::Revoked;
            }
            Err(e) => {
                tracing::error!(error = %e, token = %token, "Session lookup failed during validation");
                return TokenVerdict::Revoked;
            }
        }

        // Activity tracking must never slow down or fail the request.
        if user.needs_activity_refresh(self.config.last_active_debounce, now) {
            let repo = Arc::clone(&self.repo);
            tokio::spawn(async move {
                if let Err(e) = repo.touch_last_active(&user_id, now).await {
                    tracing::warn!(error = %e, user_id = %user_id, "Failed to record last activity");
                }
            });
        }

        TokenVerdict::Valid(Box::new(claims))
    }

    /// Boolean access-token check for callers that only need yes/no.
    pub async fn validate_access_token(&self, token: &str, ctx: &RequestContext) -> bool {
        self.execute(token, ctx).await.is_valid()
    }

    /// Boolean refresh-token check: signature/device, live session, owner
    /// matches the subject, and the account is still active.
    pub async fn validate_refresh_token(&self, token: &str, ctx: &RequestContext) -> bool {
        let claims = match self.codec.verify_refresh(token, ctx) {
            Ok(claims) => claims,
            Err(_) => return false,
        };

        match self.store.find_user_by_refresh_token(token, Utc::now()).await {
            Ok(Some(owner)) => {
                owner.user_id.to_string() == claims.sub && owner.is_active()
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, "Session lookup failed during refresh validation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::application::codec::SessionInfo;
    use crate::application::testing::InMemoryRepo;
    use crate::domain::entity::User;
    use crate::domain::value_object::UserStatus;
    use platform::client::DeviceFingerprint;

    const UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0 Safari/537.36";

    fn ctx_for(user_agent: &str) -> RequestContext {
        let ip = "198.51.100.23".parse().unwrap();
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
        validator: SessionValidator<InMemoryRepo>,
        store: SessionStore<InMemoryRepo>,
        codec: TokenCodec,
        repo: InMemoryRepo,
        ctx: RequestContext,
    }

    fn fixture() -> Fixture {
        let config = Arc::new(SessionConfig::with_secret("validator-test-secret"));
        let repo = InMemoryRepo::new();
        let arc_repo = Arc::new(repo.clone());
        Fixture {
            validator: SessionValidator::new(Arc::clone(&arc_repo), Arc::clone(&config)),
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
    async fn test_valid_token_passes_with_claims() {
        let f = fixture();
        let (user, info) = signed_in_user(&f).await;

        let verdict = f.validator.execute(&info.access_token, &f.ctx).await;
        match verdict {
            TokenVerdict::Valid(claims) => {
                assert_eq!(claims.sub, user.user_id.to_string());
                assert_eq!(claims.name, "ada");
            }
            other => panic!("expected Valid, got {other:?}"),
        }
        assert!(f.validator.validate_access_token(&info.access_token, &f.ctx).await);
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let f = fixture();
        assert!(matches!(
            f.validator.execute("not-a-token", &f.ctx).await,
            TokenVerdict::Malformed
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let f = fixture();
        let user = User::new("ada");
        f.repo.insert_user(user.clone());
        let info = f
            .codec
            .mint_session(&user, &f.ctx, Utc::now() - chrono::Duration::days(2))
            .unwrap();
        f.store.add_session(user.user_id, &info).await.unwrap();

        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::Expired
        ));
    }

    #[tokio::test]
    async fn test_other_device_is_rejected() {
        let f = fixture();
        let (_, info) = signed_in_user(&f).await;

        let phone_ctx = ctx_for("Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) Safari/604.1");
        assert!(matches!(
            f.validator.execute(&info.access_token, &phone_ctx).await,
            TokenVerdict::DeviceMismatch
        ));
    }

    #[tokio::test]
    async fn test_deleted_user_is_unknown() {
        let f = fixture();
        let user = User::new("ada");
        // Token minted but the user was never persisted (deleted account).
        let info = f.codec.mint_session(&user, &f.ctx, Utc::now()).unwrap();
        f.store.add_session(user.user_id, &info).await.unwrap();

        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::UnknownUser
        ));
    }

    #[tokio::test]
    async fn test_stamp_rotation_invalidates_outstanding_tokens() {
        let f = fixture();
        let (mut user, info) = signed_in_user(&f).await;

        user.rotate_security_stamp();
        f.repo.update_user(user);

        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::StaleCredentials
        ));
    }

    #[tokio::test]
    async fn test_disabled_account_is_rejected() {
        let f = fixture();
        let (mut user, info) = signed_in_user(&f).await;

        user.set_status(UserStatus::Disabled);
        // set_status does not rotate the stamp, so this isolates the check.
        f.repo.update_user(user);

        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::InactiveAccount
        ));
    }

    #[tokio::test]
    async fn test_signed_out_token_is_revoked() {
        let f = fixture();
        let (user, info) = signed_in_user(&f).await;

        f.store
            .remove_session(user.user_id, &info.access_token)
            .await
            .unwrap();

        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::Revoked
        ));
    }

    #[tokio::test]
    async fn test_infrastructure_failures_reject_instead_of_erroring() {
        let f = fixture();
        let (_, info) = signed_in_user(&f).await;

        f.repo.fail_users.store(true, Ordering::SeqCst);
        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::UnknownUser
        ));
        f.repo.fail_users.store(false, Ordering::SeqCst);

        f.repo.fail_sessions.store(true, Ordering::SeqCst);
        assert!(matches!(
            f.validator.execute(&info.access_token, &f.ctx).await,
            TokenVerdict::Revoked
        ));
    }

    #[tokio::test]
    async fn test_validation_touches_last_active() {
        let f = fixture();
        let (user, info) = signed_in_user(&f).await;
        assert!(f.repo.user(&user.user_id).unwrap().last_active_at.is_none());

        assert!(f.validator.execute(&info.access_token, &f.ctx).await.is_valid());

        // The activity write is spawned; yield so it gets to run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(f.repo.user(&user.user_id).unwrap().last_active_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_token_boolean_check() {
        let f = fixture();
        let (user, info) = signed_in_user(&f).await;

        assert!(f.validator.validate_refresh_token(&info.refresh_token, &f.ctx).await);
        // An access token is not a refresh token.
        assert!(!f.validator.validate_refresh_token(&info.access_token, &f.ctx).await);

        f.store.revoke_all(user.user_id).await.unwrap();
        assert!(!f.validator.validate_refresh_token(&info.refresh_token, &f.ctx).await);
    }
}
