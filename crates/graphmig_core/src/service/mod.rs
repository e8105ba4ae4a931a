//! Stateless mutation services.
//!
//! # Responsibility
//! - Build content update, reclassification, guid remapping, cascading
//!   removal and delint on the repository contract alone.
//! - Provide the version gate every migration step starts and ends with.
//!
//! # Invariants
//! - Services hold no state between calls; the repository is passed in.
//! - Services never bypass repository index maintenance.

pub mod content;
pub mod delint;
pub mod identity;
pub mod removal;
pub mod version;

pub use content::{change_to_subclass, update_dto, DtoContent};
pub use delint::{delint, find_zombies, DelintReport};
pub use identity::{change_guid, owner_and_owned};
pub use removal::remove_including_owned;
pub use version::{check_version, increment_version};
