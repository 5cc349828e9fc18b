//! Task record and its equality filter.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier.
pub type TaskId = i64;

/// Maximum title length enforced by the `tasks` schema.
pub const TASK_TITLE_MAX_CHARS: usize = 200;
/// Maximum description length enforced by the `tasks` schema.
pub const TASK_DESCRIPTION_MAX_CHARS: usize = 1000;

/// One unit of work, optionally owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// May be empty, never null.
    pub description: String,
    pub completed: bool,
    /// Owning user. `None` for unowned tasks.
    pub user_id: Option<UserId>,
}

impl Task {
    pub fn is_owned(&self) -> bool {
        self.user_id.is_some()
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task(id={}, title={}, description={}, completed={})",
            self.id, self.title, self.description, self.completed
        )
    }
}

/// Equality filter over task columns. Set fields are ANDed; an empty filter
/// matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub id: Option<TaskId>,
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub user_id: Option<UserId>,
}

impl TaskFilter {
    pub fn by_id(id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.completed.is_none()
            && self.user_id.is_none()
    }
}
