//! Sign Out
//!
//! Retires sessions. Both flows are idempotent: signing out a token whose
//! session is already gone succeeds silently, since the end state is what
//! the caller asked for.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::SessionConfig;
use crate::application::store::SessionStore;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::SessionResult;

/// Sign-out use case.
pub struct SignOut<R> {
    store: SessionStore<R>,
}

impl<R> Clone for SignOut<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<R> SignOut<R>
where
    R: SessionRepository + UserRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self {
            store: SessionStore::new(repo, config),
        }
    }

    /// End the session the presented access token belongs to.
    pub async fn execute(&self, access_token: &str) -> SessionResult<()> {
        let now = Utc::now();
        let Some(owner) = self.store.find_user_by_access_token(access_token, now).await? else {
            // Already gone; nothing to do.
            return Ok(());
        };

        self.store.remove_session(owner.user_id, access_token).await?;
        tracing::info!(user_id = %owner.user_id, "Signed out");
        Ok(())
    }

    /// End every session of the user the presented access token belongs to.
    pub async fn execute_all(&self, access_token: &str) -> SessionResult<()> {
        let now = Utc::now();
        let Some(owner) = self.store.find_user_by_access_token(access_token, now).await? else {
            return Ok(());
        };

        self.store.revoke_all(owner.user_id).await?;
        tracing::info!(user_id = %owner.user_id, "Signed out everywhere");
        Ok(())
    }
}
