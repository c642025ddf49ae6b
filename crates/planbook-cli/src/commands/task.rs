use chrono::NaiveDate;
use clap::Subcommand;
use planbook_core::{TaskPath, TaskStatus};

use super::{day, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Set a task's status (pending, done, quit)
    Set {
        path: TaskPath,
        status: TaskStatus,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Toggle a task between done and not done
    Toggle {
        path: TaskPath,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let ctx = Context::open()?;

    let (path, date, status) = match action {
        TaskAction::Set { path, status, date } => {
            let mut plan = ctx.require_plan(day(date))?;
            plan.set_status(&path, status)?;
            ctx.store.save_plan(&plan)?;
            (path, plan.date, status)
        }
        TaskAction::Toggle { path, date } => {
            let mut plan = ctx.require_plan(day(date))?;
            let status = plan.toggle(&path)?;
            ctx.store.save_plan(&plan)?;
            (path, plan.date, status)
        }
    };

    print_json(&serde_json::json!({
        "date": date,
        "path": path,
        "status": status,
    }))
}
