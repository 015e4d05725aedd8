//! Domain Layer
//!
//! Business entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;
