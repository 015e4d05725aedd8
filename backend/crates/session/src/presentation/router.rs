//! Session Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::SessionConfig;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::infra::postgres::PgSessionRepository;
use crate::presentation::handlers::{self, SessionAppState};

/// Create the session router with PostgreSQL repository
pub fn session_router(repo: PgSessionRepository, config: SessionConfig) -> Router {
    session_router_generic(repo, config)
}

/// Create a generic session router for any repository implementation
pub fn session_router_generic<R>(repo: R, config: SessionConfig) -> Router
where
    R: SessionRepository + UserRepository + Clone + Send + Sync + 'static,
{
    let state = SessionAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/signout/all", post(handlers::sign_out_all::<R>))
        .route("/status", get(handlers::session_status::<R>))
        .with_state(state)
}
