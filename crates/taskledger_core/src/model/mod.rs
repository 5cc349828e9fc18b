//! Entity model for users and the tasks they own.
//!
//! # Responsibility
//! - Define the record shapes persisted by the repositories.
//! - Provide typed equality filters and update sets in place of free-form maps.
//!
//! # Invariants
//! - Ids are assigned by storage and never change after insert.
//! - The owning edge is `User.tasks`; a task refers back only through `user_id`.

pub mod task;
pub mod user;
