use rusqlite::Connection;
use taskledger_core::model::task::{TASK_DESCRIPTION_MAX_CHARS, TASK_TITLE_MAX_CHARS};
use taskledger_core::{
    open_db_in_memory, RepoError, SqliteTaskRepository, SqliteUserRepository, TaskFilter,
    TaskRepository, UserFilter, UserRepository,
};

#[test]
fn owned_task_shows_up_in_owner_tasks() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let user = users
        .create_user("John Doe", "john.doe@example.com", 30)
        .unwrap();
    let task = tasks
        .create_task("Buy groceries", "Buy groceries", false, Some(user.id))
        .unwrap();
    assert_eq!(task.user_id, Some(user.id));
    assert!(!task.completed);

    let owner = users.get_user(&UserFilter::by_id(user.id)).unwrap().unwrap();
    assert_eq!(owner.tasks, vec![task]);
}

#[test]
fn unowned_task_is_retrievable_without_owner() {
    let conn = open_db_in_memory().unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let created = tasks
        .create_task("Loose end", "no owner", true, None)
        .unwrap();

    let loaded = tasks
        .get_task(&TaskFilter::by_id(created.id))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.user_id, None);
    assert!(loaded.completed);
}

#[test]
fn task_with_unknown_owner_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = tasks
        .create_task("Orphan", "", false, Some(42))
        .unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert!(tasks.get_task(&TaskFilter::default()).unwrap().is_none());
}

#[test]
fn schema_enforces_title_and_description_lengths() {
    let conn = open_db_in_memory().unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let description = "d".repeat(TASK_DESCRIPTION_MAX_CHARS + 1);
    let err = tasks
        .create_task("Too long", &description, false, None)
        .unwrap_err();
    assert!(err.is_constraint_violation());

    let title = "t".repeat(TASK_TITLE_MAX_CHARS + 1);
    assert!(tasks
        .create_task(&title, "", false, None)
        .unwrap_err()
        .is_constraint_violation());

    let at_limit = "d".repeat(TASK_DESCRIPTION_MAX_CHARS);
    tasks
        .create_task("Just right", &at_limit, false, None)
        .unwrap();
}

#[test]
fn get_task_filters_by_fields_and_returns_lowest_id() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let user = users.create_user("A", "a@example.com", 1).unwrap();
    tasks.create_task("open", "", false, None).unwrap();
    let first_done = tasks.create_task("done", "", true, Some(user.id)).unwrap();
    tasks.create_task("done", "", true, Some(user.id)).unwrap();

    let filter = TaskFilter {
        completed: Some(true),
        user_id: Some(user.id),
        ..TaskFilter::default()
    };
    let found = tasks.get_task(&filter).unwrap().unwrap();
    assert_eq!(found.id, first_done.id);

    let by_title = TaskFilter {
        title: Some("missing".to_string()),
        ..TaskFilter::default()
    };
    assert!(tasks.get_task(&by_title).unwrap().is_none());
}

#[test]
fn corrupted_completed_value_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = tasks.create_task("t", "", false, None).unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute("UPDATE tasks SET completed = 7 WHERE id = ?1;", [task.id])
        .unwrap();

    let err = tasks.get_task(&TaskFilter::by_id(task.id)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_connection_missing_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        taskledger_core::db::migrations::latest_version()
    ))
    .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("tasks"))
    ));
}
