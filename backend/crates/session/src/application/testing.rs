//! In-memory repository doubles shared by the application-layer tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::domain::entity::{Session, User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::UserId;
use crate::error::{SessionError, SessionResult};

/// Vec-backed repository implementing both traits. `fail_users` /
/// `fail_sessions` flip the corresponding methods into returning errors, to
/// exercise infrastructure-failure paths.
#[derive(Clone, Default)]
pub struct InMemoryRepo {
    users: Arc<Mutex<Vec<User>>>,
    sessions: Arc<Mutex<Vec<Session>>>,
    pub fail_users: Arc<AtomicBool>,
    pub fail_sessions: Arc<AtomicBool>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn update_user(&self, user: User) {
        let mut users = self.users.lock().unwrap();
        if let Some(slot) = users.iter_mut().find(|u| u.user_id == user.user_id) {
            *slot = user;
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn user(&self, user_id: &UserId) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.user_id == user_id)
            .cloned()
    }

    fn check_users(&self) -> SessionResult<()> {
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(SessionError::Internal("user storage offline".to_string()));
        }
        Ok(())
    }

    fn check_sessions(&self) -> SessionResult<()> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(SessionError::Internal(
                "session storage offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl UserRepository for InMemoryRepo {
    async fn find_by_id(&self, user_id: &UserId) -> SessionResult<Option<User>> {
        self.check_users()?;
        Ok(self.user(user_id))
    }

    async fn touch_last_active(&self, user_id: &UserId, at: DateTime<Utc>) -> SessionResult<()> {
        self.check_users()?;
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| &u.user_id == user_id) {
            user.last_active_at = Some(at);
        }
        Ok(())
    }
}

impl SessionRepository for InMemoryRepo {
    async fn create(&self, session: &Session) -> SessionResult<()> {
        self.check_sessions()?;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn replace_for_user(&self, user_id: &UserId, session: &Session) -> SessionResult<()> {
        self.check_sessions()?;
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|s| &s.user_id != user_id);
        sessions.push(session.clone());
        Ok(())
    }

    async fn find_by_access_hash(&self, hash: &str) -> SessionResult<Option<Session>> {
        self.check_sessions()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.access_token_hash == hash)
            .cloned())
    }

    async fn find_by_refresh_hash(&self, hash: &str) -> SessionResult<Option<Session>> {
        self.check_sessions()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.refresh_token_hash == hash)
            .cloned())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> SessionResult<u64> {
        self.check_sessions()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| &s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_by_token_hash(
        &self,
        user_id: &UserId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<u64> {
        self.check_sessions()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| {
            let matches = &s.user_id == user_id
                && ((s.access_token_hash == hash && !s.access_expired(now))
                    || (s.refresh_token_hash == hash && !s.refresh_expired(now)));
            !matches
        });
        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> SessionResult<u64> {
        self.check_sessions()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !s.fully_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
