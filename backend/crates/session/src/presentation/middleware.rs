//! Session Middleware
//!
//! Middleware for requiring a validated session on protected routes.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::RequestContext;
use std::sync::Arc;

use crate::application::SessionValidator;
use crate::application::codec::AccessClaims;
use crate::application::config::SessionConfig;
use crate::domain::repository::{SessionRepository, UserRepository};

/// Middleware state
#[derive(Clone)]
pub struct SessionMiddlewareState<R>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<SessionConfig>,
}

/// Authenticated principal stored in request extensions after validation
#[derive(Clone)]
pub struct CurrentUser {
    pub claims: AccessClaims,
}

/// Authentication status stored in request extensions
#[derive(Clone, Copy)]
pub struct AuthStatus {
    pub is_authenticated: bool,
}

/// Middleware that requires a valid session token
pub async fn require_session<R>(
    state: SessionMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let ctx = request_context(&req);
    let Some(token) = extract_token(&req) else {
        return Err(unauthorized());
    };

    let validator = SessionValidator::new(state.repo.clone(), state.config.clone());
    let verdict = validator.execute(&token, &ctx).await;

    match verdict {
        crate::application::TokenVerdict::Valid(claims) => {
            req.extensions_mut().insert(CurrentUser { claims: *claims });
            Ok(next.run(req).await)
        }
        _ => Err(unauthorized()),
    }
}

/// Middleware that checks the session but doesn't require it.
/// Sets [`AuthStatus`] (and [`CurrentUser`] when valid) for downstream
/// handlers.
pub async fn check_session<R>(
    state: SessionMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let ctx = request_context(&req);

    let mut is_authenticated = false;
    if let Some(token) = extract_token(&req) {
        let validator = SessionValidator::new(state.repo.clone(), state.config.clone());
        if let crate::application::TokenVerdict::Valid(claims) =
            validator.execute(&token, &ctx).await
        {
            is_authenticated = true;
            req.extensions_mut().insert(CurrentUser { claims: *claims });
        }
    }

    req.extensions_mut().insert(AuthStatus { is_authenticated });
    next.run(req).await
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response()
}

fn request_context(req: &Request<Body>) -> RequestContext {
    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    RequestContext::from_request(req.headers(), direct_ip)
}

/// Bearer token from the Authorization header, falling back to the
/// `access_token` query parameter (WebSocket handshakes cannot set headers).
fn extract_token(req: &Request<Body>) -> Option<String> {
    if let Some(token) = bearer_token(req.headers()) {
        return Some(token);
    }

    req.uri().query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "access_token" && !value.is_empty()).then(|| value.to_string())
    })
}

/// Token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
