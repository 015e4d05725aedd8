//! Session Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - HS256 access/refresh token pairs with rotation
//! - Server-side session registry keyed by token digest
//! - Device-fingerprint binding of every minted token
//! - Security-stamp invalidation on credential change
//! - Single- or multi-session mode per deployment
//!
//! ## Security Model
//! - Raw tokens are never persisted; only SHA-256 digests
//! - Signing secret is mandatory configuration; startup fails without it
//! - Validation yields a verdict, never an error: infrastructure failures
//!   deny the request instead of leaking a 500

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::SessionConfig;
pub use application::{SessionValidator, TokenCodec, TokenVerdict};
pub use error::{SessionError, SessionResult};
pub use infra::postgres::PgSessionRepository;
pub use presentation::router::session_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgSessionRepository as SessionRepositoryStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
