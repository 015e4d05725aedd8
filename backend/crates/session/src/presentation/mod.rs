//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::SessionAppState;
pub use middleware::{
    AuthStatus, CurrentUser, SessionMiddlewareState, check_session, require_session,
};
pub use router::{session_router, session_router_generic};
