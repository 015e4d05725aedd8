//! Infrastructure Layer
//!
//! Concrete persistence backing the domain repository traits.

pub mod postgres;

pub use postgres::PgSessionRepository;
