//! Repository contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Expose use-case oriented data access for users and tasks.
//! - Keep SQL, sessions and row decoding behind the repository traits.
//!
//! # Invariants
//! - Repositories borrow an injected connection; they never open one.
//! - Storage errors are returned unchanged inside `RepoError::Db`; absent
//!   rows are `Ok(None)`, not errors.

pub mod task_repo;
pub mod user_repo;
