//! Demo driver for `taskledger_core`.
//!
//! # Responsibility
//! - Reset the example database and run a fixed sequence of repository calls.
//! - Print each result; the first failure ends the run.

use log::info;
use std::error::Error;
use taskledger_core::{
    default_log_level, init_logging, open_db, reset_schema, SqliteTaskRepository,
    SqliteUserRepository, TaskFilter, TaskRepository, UserFilter, UserRepository, UserUpdate,
};

const DB_FILE_NAME: &str = "example.db";
const LOG_DIR_NAME: &str = "logs";

fn main() -> Result<(), Box<dyn Error>> {
    let work_dir = std::env::current_dir()?;
    init_logging(default_log_level(), work_dir.join(LOG_DIR_NAME))?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        taskledger_core::core_version()
    );

    let mut conn = open_db(work_dir.join(DB_FILE_NAME))?;
    reset_schema(&mut conn)?;

    let users = SqliteUserRepository::try_new(&conn)?;
    let tasks = SqliteTaskRepository::try_new(&conn)?;

    let john = users.create_user("John Doe", "john.doe@example.com", 30)?;
    users.create_user("John Snow", "john2.doe@example.com", 33)?;
    users.create_user("John 3", "john3.doe@example.com", 11)?;

    tasks.create_task("Buy groceries", "Buy groceries", false, Some(john.id))?;
    if let Some(task) = tasks.get_task(&TaskFilter::by_id(1))? {
        println!("Task 1 {task}");
    }

    let first = users.get_user(&UserFilter::default())?;
    match &first {
        Some(user) => println!("User 1 {user}"),
        None => println!("User 1 None"),
    }

    let all = users.get_users(&UserFilter::default())?;
    println!("All users [{}]", join_display(&all));

    if let Some(user) = first {
        let updated = users.update_user(&UserFilter::by_id(user.id), &UserUpdate::age(111))?;
        match updated {
            Some(user) => println!("Updated user {user}"),
            None => println!("Updated user None"),
        }
    }

    let counts = users.get_users_tasks_count()?;
    println!("Users tasks count [{}]", join_display(&counts));

    info!("event=cli_finish module=cli status=ok");
    Ok(())
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
