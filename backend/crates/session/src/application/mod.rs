//! Application Layer
//!
//! Use cases and session services built on the domain layer.

pub mod codec;
pub mod config;
pub mod refresh;
pub mod sign_out;
pub mod store;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{AccessClaims, RefreshClaims, SessionInfo, TokenCodec, TokenRejection};
pub use config::{SessionConfig, TOKEN_TYPE};
pub use refresh::RefreshSession;
pub use sign_out::SignOut;
pub use store::SessionStore;
pub use validate::{SessionValidator, TokenVerdict};
