//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks, owned or unowned.
//! - Answer equality-filter lookups without loading the owner.
//!
//! # Invariants
//! - A task with `user_id` must reference an existing user (FK enforced).
//! - Reads reject persisted `completed` values outside `{0, 1}`.

use crate::db::SessionFactory;
use crate::model::task::{Task, TaskFilter};
use crate::model::user::UserId;
use crate::repo::user_repo::{ensure_connection_ready, RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::time::Instant;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    completed,
    user_id
FROM tasks";

pub(crate) const TASK_COLUMNS: &[&str] =
    &["id", "title", "description", "completed", "user_id"];

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Inserts one task and returns it with its assigned id.
    fn create_task(
        &self,
        title: &str,
        description: &str,
        completed: bool,
        user_id: Option<UserId>,
    ) -> RepoResult<Task>;
    /// Returns the first task (by id) matching `filter`.
    fn get_task(&self, filter: &TaskFilter) -> RepoResult<Option<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    sessions: SessionFactory<'conn>,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self {
            sessions: SessionFactory::new(conn),
        })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(
        &self,
        title: &str,
        description: &str,
        completed: bool,
        user_id: Option<UserId>,
    ) -> RepoResult<Task> {
        let started_at = Instant::now();
        let result = self.sessions.run("create_task", |session| -> RepoResult<Task> {
            let conn = session.conn();
            conn.execute(
                "INSERT INTO tasks (title, description, completed, user_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![title, description, bool_to_int(completed), user_id],
            )?;

            Ok(Task {
                id: conn.last_insert_rowid(),
                title: title.to_string(),
                description: description.to_string(),
                completed,
                user_id,
            })
        });

        match &result {
            Ok(task) => info!(
                "event=task_create module=repo status=ok task_id={} owned={} duration_ms={}",
                task.id,
                task.is_owned(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=task_create module=repo status=error constraint={} duration_ms={} error={}",
                err.is_constraint_violation(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn get_task(&self, filter: &TaskFilter) -> RepoResult<Option<Task>> {
        self.sessions.run("get_task", |session| -> RepoResult<Option<Task>> {
            let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();
            push_task_filter(&mut sql, &mut bind_values, filter);
            sql.push_str(" ORDER BY id ASC LIMIT 1;");

            let mut stmt = session.conn().prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let task = match rows.next()? {
                Some(row) => Some(parse_task_row(row)?),
                None => None,
            };

            debug!(
                "event=task_get module=repo status=ok filtered={} found={}",
                !filter.is_empty(),
                task.is_some()
            );
            Ok(task)
        })
    }
}

fn push_task_filter(sql: &mut String, bind_values: &mut Vec<Value>, filter: &TaskFilter) {
    if let Some(id) = filter.id {
        sql.push_str(" AND id = ?");
        bind_values.push(Value::Integer(id));
    }
    if let Some(title) = filter.title.as_ref() {
        sql.push_str(" AND title = ?");
        bind_values.push(Value::Text(title.clone()));
    }
    if let Some(completed) = filter.completed {
        sql.push_str(" AND completed = ?");
        bind_values.push(Value::Integer(bool_to_int(completed)));
    }
    if let Some(user_id) = filter.user_id {
        sql.push_str(" AND user_id = ?");
        bind_values.push(Value::Integer(user_id));
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: parse_completed(row.get("completed")?)?,
        user_id: row.get("user_id")?,
    })
}

/// Decodes the `tasks.completed` storage value.
pub(crate) fn parse_completed(value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid completed value `{other}` in tasks.completed"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
