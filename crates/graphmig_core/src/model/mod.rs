//! Domain object model for the migration core.
//!
//! # Responsibility
//! - Define the DTO value every repository operation moves around.
//! - Define the class hierarchy that drives class-bucket indexing.
//!
//! # Invariants
//! - Every domain object is identified by a stable `Guid`.
//! - A DTO's class and identity are derived from its own content.

pub mod class;
pub mod dto;
