//! Session Error Types
//!
//! Session-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! Request-time validation outcomes are NOT errors: they are
//! [`TokenVerdict`](crate::application::validate::TokenVerdict) values.
//! `SessionError` covers minting, store, and infrastructure failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Session-specific result type alias
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific error variants
#[derive(Debug, Error)]
pub enum SessionError {
    /// Token owner no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Session row missing or already expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Token failed signature/issuer/audience checks
    #[error("Token rejected")]
    TokenRejected,

    /// Token expired; caller should run the refresh flow
    #[error("Token has expired")]
    TokenExpired,

    /// Token presented from a device other than the one it was minted for
    #[error("Token used from an unrecognized device")]
    DeviceMismatch,

    /// Security stamp no longer matches (password/role changed since mint)
    #[error("Credentials changed since the token was issued")]
    CredentialsChanged,

    /// Account exists but is not allowed to authenticate
    #[error("Account is inactive")]
    AccountInactive,

    /// Startup/config failure (e.g. missing signing secret)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token minting failed
    #[error("Token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::UserNotFound => StatusCode::NOT_FOUND,
            SessionError::SessionInvalid
            | SessionError::TokenRejected
            | SessionError::TokenExpired
            | SessionError::DeviceMismatch
            | SessionError::CredentialsChanged => StatusCode::UNAUTHORIZED,
            SessionError::AccountInactive => StatusCode::FORBIDDEN,
            SessionError::Config(_)
            | SessionError::TokenEncoding(_)
            | SessionError::Database(_)
            | SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::UserNotFound => ErrorKind::NotFound,
            SessionError::SessionInvalid
            | SessionError::TokenRejected
            | SessionError::TokenExpired
            | SessionError::DeviceMismatch
            | SessionError::CredentialsChanged => ErrorKind::Unauthorized,
            SessionError::AccountInactive => ErrorKind::Forbidden,
            SessionError::Config(_)
            | SessionError::TokenEncoding(_)
            | SessionError::Database(_)
            | SessionError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            SessionError::DeviceMismatch | SessionError::CredentialsChanged => {
                err.with_action("Please sign in again")
            }
            SessionError::TokenExpired => err.with_action("Refresh your session"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            SessionError::Database(e) => {
                tracing::error!(error = %e, "Session database error");
            }
            SessionError::TokenEncoding(e) => {
                tracing::error!(error = %e, "Token encoding error");
            }
            SessionError::Config(msg) | SessionError::Internal(msg) => {
                tracing::error!(message = %msg, "Session internal error");
            }
            SessionError::DeviceMismatch => {
                tracing::warn!("Token presented from an unrecognized device");
            }
            SessionError::CredentialsChanged => {
                tracing::warn!("Token rejected after credential change");
            }
            _ => {
                tracing::debug!(error = %self, "Session error");
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for SessionError {
    fn from(err: AppError) -> Self {
        SessionError::Internal(err.to_string())
    }
}
