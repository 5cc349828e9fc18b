//! User record, equality filter, update set and task-count aggregate.
//!
//! # Invariants
//! - `email` is unique across all users (enforced by storage).
//! - `tasks` is ordered by ascending task id.

use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned user identifier.
pub type UserId = i64;

/// Maximum name length enforced by the `users` schema.
pub const USER_NAME_MAX_CHARS: usize = 50;
/// Maximum email length enforced by the `users` schema.
pub const USER_EMAIL_MAX_CHARS: usize = 100;

/// A user together with the tasks it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: i64,
    /// Always materialized by repository reads.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User(id={}, name={}, email={}, age={}, tasks=[",
            self.id, self.name, self.email, self.age
        )?;
        for (index, task) in self.tasks.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{task}")?;
        }
        f.write_str("])")
    }
}

/// Equality filter over user columns. Set fields are ANDed; an empty filter
/// matches every user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
}

impl UserFilter {
    pub fn by_id(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.age.is_none()
    }
}

/// Column values to write in a bulk user update. `None` leaves a column as is.
///
/// `id` is deliberately absent: ids are immutable once assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
}

impl UserUpdate {
    pub fn age(age: i64) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }
}

/// One row of the per-user task count aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTaskCount {
    pub user_id: UserId,
    pub user_name: String,
    pub task_count: i64,
}

impl Display for UserTaskCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.user_id, self.user_name, self.task_count)
    }
}
