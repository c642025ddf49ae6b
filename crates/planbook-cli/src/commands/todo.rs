use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use planbook_core::Todo;
use serde::Serialize;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum TodoAction {
    /// Add a to-do with a deadline
    Add {
        title: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: NaiveDate,
    },
    /// List to-dos, open ones first
    List {
        /// Only open items past their deadline
        #[arg(long)]
        overdue: bool,
    },
    /// Toggle completion
    Toggle { id: u64 },
    /// Delete a to-do
    Delete { id: u64 },
}

#[derive(Serialize)]
struct TodoView<'a> {
    #[serde(flatten)]
    todo: &'a Todo,
    days_remaining: i64,
    overdue: bool,
}

fn view(todo: &Todo, today: NaiveDate) -> TodoView<'_> {
    TodoView {
        todo,
        days_remaining: todo.days_remaining(today),
        overdue: todo.is_overdue(today),
    }
}

pub fn run(action: TodoAction) -> CmdResult {
    let ctx = Context::open()?;
    let mut todos = ctx.store.load_todos()?;
    let today = Local::now().date_naive();

    match action {
        TodoAction::Add { title, deadline } => {
            let todo = todos.add(&title, deadline, Utc::now())?;
            ctx.store.save_todos(&todos)?;
            print_json(&view(&todo, today))?;
        }
        TodoAction::List { overdue } => {
            let listed = if overdue {
                todos.overdue(today)
            } else {
                todos.sorted()
            };
            let views: Vec<TodoView> = listed.into_iter().map(|t| view(t, today)).collect();
            print_json(&views)?;
        }
        TodoAction::Toggle { id } => {
            let completed = todos.toggle(id, Utc::now())?;
            ctx.store.save_todos(&todos)?;
            print_json(&serde_json::json!({ "id": id, "completed": completed }))?;
        }
        TodoAction::Delete { id } => {
            let removed = todos.delete(id)?;
            ctx.store.save_todos(&todos)?;
            print_json(&serde_json::json!({ "deleted": removed.title }))?;
        }
    }
    Ok(())
}
