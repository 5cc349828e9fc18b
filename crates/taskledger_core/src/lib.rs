//! Core data access for the task ledger.
//! Users own tasks; repositories persist both in SQLite through scoped sessions.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{
    open_db, open_db_in_memory, reset_schema, DbError, DbResult, Session, SessionFactory,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskFilter, TaskId};
pub use model::user::{User, UserFilter, UserId, UserTaskCount, UserUpdate};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{RepoError, RepoResult, SqliteUserRepository, UserRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
