//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{Session, User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{SecurityStamp, UserId, UserRole, UserStatus};
use crate::error::SessionResult;

/// PostgreSQL-backed session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgSessionRepository {
    async fn find_by_id(&self, user_id: &UserId) -> SessionResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                user_status,
                security_stamp,
                last_active_at,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn touch_last_active(&self, user_id: &UserId, at: DateTime<Utc>) -> SessionResult<()> {
        sqlx::query("UPDATE users SET last_active_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> SessionResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (
                session_id,
                user_id,
                access_token_hash,
                refresh_token_hash,
                access_expires_at,
                refresh_expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(&session.access_token_hash)
        .bind(&session.refresh_token_hash)
        .bind(session.access_expires_at)
        .bind(session.refresh_expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_for_user(&self, user_id: &UserId, session: &Session) -> SessionResult<()> {
        // Delete and insert must commit together: two concurrent sign-ins
        // may interleave, but only one session survives either ordering.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_sessions (
                session_id,
                user_id,
                access_token_hash,
                refresh_token_hash,
                access_expires_at,
                refresh_expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(&session.access_token_hash)
        .bind(&session.refresh_token_hash)
        .bind(session.access_expires_at)
        .bind(session.refresh_expires_at)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_access_hash(&self, hash: &str) -> SessionResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                access_token_hash,
                refresh_token_hash,
                access_expires_at,
                refresh_expires_at,
                created_at
            FROM user_sessions
            WHERE access_token_hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn find_by_refresh_hash(&self, hash: &str) -> SessionResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                access_token_hash,
                refresh_token_hash,
                access_expires_at,
                refresh_expires_at,
                created_at
            FROM user_sessions
            WHERE refresh_token_hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn delete_for_user(&self, user_id: &UserId) -> SessionResult<u64> {
        let deleted = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn delete_by_token_hash(
        &self,
        user_id: &UserId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE user_id = $1
              AND (
                  (access_token_hash = $2 AND access_expires_at > $3)
                  OR (refresh_token_hash = $2 AND refresh_expires_at > $3)
              )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(hash)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> SessionResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM user_sessions WHERE access_expires_at <= $1 AND refresh_expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");
        }
        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    user_role: i16,
    user_status: i16,
    security_stamp: String,
    last_active_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: self.user_name,
            user_role: UserRole::from_id(self.user_role),
            user_status: UserStatus::from_id(self.user_status),
            security_stamp: SecurityStamp::from_string(self.security_stamp),
            last_active_at: self.last_active_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    access_token_hash: String,
    refresh_token_hash: String,
    access_expires_at: DateTime<Utc>,
    refresh_expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            access_token_hash: self.access_token_hash,
            refresh_token_hash: self.refresh_token_hash,
            access_expires_at: self.access_expires_at,
            refresh_expires_at: self.refresh_expires_at,
            created_at: self.created_at,
        }
    }
}
