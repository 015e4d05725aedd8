//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

use platform::client::RequestContext;

use crate::application::config::SessionConfig;
use crate::application::{RefreshSession, SessionValidator, SignOut, TokenVerdict};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{SessionError, SessionResult};
use crate::presentation::dto::{RefreshRequest, SessionResponse, SessionStatusResponse};
use crate::presentation::middleware::bearer_token;

/// Shared state for session handlers
#[derive(Clone)]
pub struct SessionAppState<R>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<SessionConfig>,
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/session/refresh
pub async fn refresh<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<RefreshRequest>,
) -> SessionResult<Json<SessionResponse>>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let ctx = RequestContext::from_request(&headers, Some(addr.ip()));

    let use_case = RefreshSession::new(state.repo.clone(), state.config.clone());
    let info = use_case.execute(&req.refresh_token, &ctx).await?;

    Ok(Json(SessionResponse::from(info)))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/session/signout
pub async fn sign_out<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
) -> SessionResult<StatusCode>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let token = bearer_token(&headers).ok_or(SessionError::TokenRejected)?;

    let use_case = SignOut::new(state.repo.clone(), state.config.clone());
    use_case.execute(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/session/signout/all
pub async fn sign_out_all<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
) -> SessionResult<StatusCode>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let token = bearer_token(&headers).ok_or(SessionError::TokenRejected)?;

    let use_case = SignOut::new(state.repo.clone(), state.config.clone());
    use_case.execute_all(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/session/status
///
/// Always 200; an invalid or absent token yields the anonymous body rather
/// than an error, so clients can poll without handling 401s.
pub async fn session_status<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> Json<SessionStatusResponse>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return Json(SessionStatusResponse::anonymous());
    };

    let ctx = RequestContext::from_request(&headers, Some(addr.ip()));
    let validator = SessionValidator::new(state.repo.clone(), state.config.clone());

    match validator.execute(&token, &ctx).await {
        TokenVerdict::Valid(claims) => Json(SessionStatusResponse {
            authenticated: true,
            user_id: Some(claims.sub.clone()),
            user_name: Some(claims.name.clone()),
            roles: claims.roles.clone(),
            expires_at_ms: Some(claims.exp * 1000),
        }),
        _ => Json(SessionStatusResponse::anonymous()),
    }
}
