//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/aggregate APIs over `users`.
//! - Materialize each user's tasks in the same joined query as the user.
//!
//! # Invariants
//! - Every call runs in exactly one session; mutations commit or roll back
//!   as a whole and surface storage errors unchanged.
//! - Read order is ascending user id, then ascending task id.
//! - Users are never deleted through this repository.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, SessionFactory};
use crate::model::task::Task;
use crate::model::user::{User, UserFilter, UserId, UserTaskCount, UserUpdate};
use crate::repo::task_repo::{parse_completed, TASK_COLUMNS};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const USER_COLUMNS: &[&str] = &["id", "name", "email", "age"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for user/task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage failure, passed through as reported by SQLite.
    Db(DbError),
    /// Connection schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted into a record.
    InvalidData(String),
    /// Operation is intentionally not supported.
    Unsupported(&'static str),
}

impl RepoError {
    /// Returns whether the underlying storage error is a constraint violation,
    /// e.g. a duplicate email or an unknown task owner.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Db(err) => err.is_constraint_violation(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Unsupported(operation) => write!(f, "operation not supported: {operation}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
            Self::Unsupported(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user persistence and aggregates.
pub trait UserRepository {
    /// Inserts one user and returns it with its assigned id and no tasks.
    fn create_user(&self, name: &str, email: &str, age: i64) -> RepoResult<User>;
    /// Returns the first user (by id) matching `filter`, tasks included.
    fn get_user(&self, filter: &UserFilter) -> RepoResult<Option<User>>;
    /// Returns all users matching `filter`, tasks included.
    fn get_users(&self, filter: &UserFilter) -> RepoResult<Vec<User>>;
    /// Applies `update` to every user matching `filter`, then returns the first
    /// match after the update. `None` when nothing matched.
    fn update_user(&self, filter: &UserFilter, update: &UserUpdate) -> RepoResult<Option<User>>;
    /// Counts tasks per user, including users without tasks.
    fn get_users_tasks_count(&self) -> RepoResult<Vec<UserTaskCount>>;
    /// Always fails: what should happen to owned tasks is not defined.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    sessions: SessionFactory<'conn>,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "users", USER_COLUMNS)?;
        ensure_connection_ready(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self {
            sessions: SessionFactory::new(conn),
        })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, name: &str, email: &str, age: i64) -> RepoResult<User> {
        let started_at = Instant::now();
        let result = self.sessions.run("create_user", |session| -> RepoResult<User> {
            let conn = session.conn();
            conn.execute(
                "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3);",
                params![name, email, age],
            )?;

            Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                email: email.to_string(),
                age,
                tasks: Vec::new(),
            })
        });

        match &result {
            Ok(user) => info!(
                "event=user_create module=repo status=ok user_id={} duration_ms={}",
                user.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=user_create module=repo status=error constraint={} duration_ms={} error={}",
                err.is_constraint_violation(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn get_user(&self, filter: &UserFilter) -> RepoResult<Option<User>> {
        self.sessions
            .run("get_user", |session| -> RepoResult<Option<User>> {
                let users = load_users_with_tasks(session.conn(), filter, Some(1))?;
                debug!(
                    "event=user_get module=repo status=ok filtered={} found={}",
                    !filter.is_empty(),
                    !users.is_empty()
                );
                Ok(users.into_iter().next())
            })
    }

    fn get_users(&self, filter: &UserFilter) -> RepoResult<Vec<User>> {
        self.sessions
            .run("get_users", |session| -> RepoResult<Vec<User>> {
                let users = load_users_with_tasks(session.conn(), filter, None)?;
                debug!(
                    "event=user_list module=repo status=ok filtered={} count={}",
                    !filter.is_empty(),
                    users.len()
                );
                Ok(users)
            })
    }

    fn update_user(&self, filter: &UserFilter, update: &UserUpdate) -> RepoResult<Option<User>> {
        let started_at = Instant::now();
        let result = self.sessions.run(
            "update_user",
            |session| -> RepoResult<(usize, Option<User>)> {
                let conn = session.conn();
                let changed = if update.is_empty() {
                    0
                } else {
                    let mut sql = String::from("UPDATE users SET ");
                    let mut bind_values = push_user_assignments(&mut sql, update);
                    sql.push_str(" WHERE 1 = 1");
                    push_user_filter(&mut sql, &mut bind_values, filter);
                    conn.execute(&sql, params_from_iter(bind_values))?
                };

                let refreshed = load_users_with_tasks(conn, filter, Some(1))?;
                Ok((changed, refreshed.into_iter().next()))
            },
        );

        match result {
            Ok((changed, user)) => {
                info!(
                    "event=user_update module=repo status=ok rows_changed={} found={} duration_ms={}",
                    changed,
                    user.is_some(),
                    started_at.elapsed().as_millis()
                );
                Ok(user)
            }
            Err(err) => {
                error!(
                    "event=user_update module=repo status=error constraint={} duration_ms={} error={}",
                    err.is_constraint_violation(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn get_users_tasks_count(&self) -> RepoResult<Vec<UserTaskCount>> {
        self.sessions
            .run("get_users_tasks_count", |session| -> RepoResult<Vec<UserTaskCount>> {
                let mut stmt = session.conn().prepare(
                    "SELECT
                        u.id AS user_id,
                        u.name AS user_name,
                        COUNT(t.id) AS task_count
                     FROM users u
                     LEFT OUTER JOIN tasks t ON t.user_id = u.id
                     GROUP BY u.id, u.name
                     ORDER BY u.id ASC;",
                )?;
                let mut rows = stmt.query([])?;
                let mut counts = Vec::new();
                while let Some(row) = rows.next()? {
                    counts.push(UserTaskCount {
                        user_id: row.get("user_id")?,
                        user_name: row.get("user_name")?,
                        task_count: row.get("task_count")?,
                    });
                }
                Ok(counts)
            })
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        error!(
            "event=user_delete module=repo status=error error_code=unsupported user_id={}",
            id
        );
        Err(RepoError::Unsupported("delete_user"))
    }
}

/// Loads users matching `filter` with all of their tasks in one joined query.
///
/// `limit` applies to users, not to joined rows.
fn load_users_with_tasks(
    conn: &Connection,
    filter: &UserFilter,
    limit: Option<u32>,
) -> RepoResult<Vec<User>> {
    let mut bind_values: Vec<Value> = Vec::new();
    let mut matched = String::from("SELECT id, name, email, age FROM users WHERE 1 = 1");
    push_user_filter(&mut matched, &mut bind_values, filter);
    matched.push_str(" ORDER BY id ASC");
    if let Some(limit) = limit {
        matched.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
    }

    let sql = format!(
        "SELECT
            u.id AS user_id,
            u.name AS user_name,
            u.email AS user_email,
            u.age AS user_age,
            t.id AS task_id,
            t.title AS task_title,
            t.description AS task_description,
            t.completed AS task_completed
         FROM ({matched}) u
         LEFT OUTER JOIN tasks t ON t.user_id = u.id
         ORDER BY u.id ASC, t.id ASC;"
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut users: Vec<User> = Vec::new();

    while let Some(row) = rows.next()? {
        let user_id: UserId = row.get("user_id")?;
        let starts_new_user = users.last().map_or(true, |user| user.id != user_id);
        if starts_new_user {
            users.push(User {
                id: user_id,
                name: row.get("user_name")?,
                email: row.get("user_email")?,
                age: row.get("user_age")?,
                tasks: Vec::new(),
            });
        }

        let task_id: Option<i64> = row.get("task_id")?;
        if let (Some(task_id), Some(user)) = (task_id, users.last_mut()) {
            user.tasks.push(Task {
                id: task_id,
                title: row.get("task_title")?,
                description: row.get("task_description")?,
                completed: parse_completed(row.get("task_completed")?)?,
                user_id: Some(user_id),
            });
        }
    }

    Ok(users)
}

fn push_user_filter(sql: &mut String, bind_values: &mut Vec<Value>, filter: &UserFilter) {
    if let Some(id) = filter.id {
        sql.push_str(" AND id = ?");
        bind_values.push(Value::Integer(id));
    }
    if let Some(name) = filter.name.as_ref() {
        sql.push_str(" AND name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(email) = filter.email.as_ref() {
        sql.push_str(" AND email = ?");
        bind_values.push(Value::Text(email.clone()));
    }
    if let Some(age) = filter.age {
        sql.push_str(" AND age = ?");
        bind_values.push(Value::Integer(age));
    }
}

/// Appends `col = ?` assignments for every set field. Caller ensures the update
/// is non-empty.
fn push_user_assignments(sql: &mut String, update: &UserUpdate) -> Vec<Value> {
    let mut assignments: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(name) = update.name.as_ref() {
        assignments.push("name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(email) = update.email.as_ref() {
        assignments.push("email = ?");
        bind_values.push(Value::Text(email.clone()));
    }
    if let Some(age) = update.age {
        assignments.push("age = ?");
        bind_values.push(Value::Integer(age));
    }

    sql.push_str(&assignments.join(", "));
    bind_values
}

/// Verifies the connection is at the latest schema version and that `table`
/// has every column in `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
