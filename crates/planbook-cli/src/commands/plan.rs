use chrono::NaiveDate;
use clap::Subcommand;
use planbook_core::task::FlatTask;
use planbook_core::daily_log::summary_required;
use planbook_core::{CarryOver, CompletionCounts, CoreError, DayPlan, TaskPath};
use serde::Serialize;

use super::{day, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Show a day's tasks and completion
    Show {
        /// Plan date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create a day plan
    Create {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Top-level task (repeatable; defaults to plan.daily_tasks)
        #[arg(long = "task", short = 't')]
        tasks: Vec<String>,
        /// Free-text plan body
        #[arg(long)]
        content: Option<String>,
        /// Replace an existing plan
        #[arg(long)]
        force: bool,
        /// Also copy the previous day's unfinished tasks
        #[arg(long)]
        carry_over: bool,
    },
    /// Copy unfinished top-level tasks from an earlier plan
    CarryOver {
        /// Top-level indices in the earlier plan (default: all unfinished)
        indices: Vec<usize>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Source plan date (default: the day before)
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// List a day's unfinished top-level tasks
    Unfinished {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Append a top-level task
    Add {
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Add sub-tasks under a task path (e.g. "0" or "0_1")
    AddSubtasks {
        path: TaskPath,
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove a top-level task by index
    Remove {
        index: usize,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List dates that have a plan
    Dates,
}

#[derive(Serialize)]
struct PlanSummary<'a> {
    date: NaiveDate,
    counts: CompletionCounts,
    percent: u32,
    tasks: Vec<FlatTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

fn summarize(plan: &DayPlan) -> PlanSummary<'_> {
    let counts = plan.counts();
    PlanSummary {
        date: plan.date,
        counts,
        percent: counts.percent(),
        tasks: plan.entries(),
        content: plan.content.as_deref(),
    }
}

pub fn run(action: PlanAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        PlanAction::Show { date } => {
            let plan = ctx.require_plan(day(date))?;
            print_json(&summarize(&plan))?;
        }
        PlanAction::Create {
            date,
            tasks,
            content,
            force,
            carry_over,
        } => {
            let date = day(date);
            if !force && ctx.store.load_plan(date)?.is_some() {
                return Err(CoreError::InvalidState(format!(
                    "a plan for {date} already exists (use --force to replace it)"
                ))
                .into());
            }
            let names = if tasks.is_empty() {
                ctx.config.plan.daily_tasks.clone()
            } else {
                tasks
            };
            let names: Vec<String> = names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect();
            if names.is_empty() {
                return Err("no tasks given; pass --task or set plan.daily_tasks".into());
            }
            let mut plan = DayPlan::new(date, names);
            plan.content = content;
            if let Some(yesterday) = date.pred_opt() {
                let previous = ctx.store.load_plan(yesterday)?;
                if summary_required(previous.as_ref(), ctx.store.load_log(yesterday)?.as_ref()) {
                    tracing::warn!(%yesterday, "the previous day has a plan but no summary");
                }
                if let (true, Some(previous)) = (carry_over, previous) {
                    plan.carry_over_from(&previous, CarryOver::All)?;
                }
            }
            ctx.store.save_plan(&plan)?;
            print_json(&summarize(&plan))?;
        }
        PlanAction::Add { name, date } => {
            let mut plan = ctx.require_plan(day(date))?;
            let path = plan.add_task(&name)?;
            ctx.store.save_plan(&plan)?;
            print_json(&serde_json::json!({ "path": path }))?;
        }
        PlanAction::AddSubtasks { path, names, date } => {
            let mut plan = ctx.require_plan(day(date))?;
            let added = plan.add_subtasks(&path, &names)?;
            ctx.store.save_plan(&plan)?;
            print_json(&serde_json::json!({ "added": added }))?;
        }
        PlanAction::Remove { index, date } => {
            let mut plan = ctx.require_plan(day(date))?;
            let removed = plan.remove_task(index)?;
            ctx.store.save_plan(&plan)?;
            print_json(&serde_json::json!({ "removed": removed.name }))?;
        }
        PlanAction::CarryOver {
            indices,
            date,
            from,
        } => {
            let date = day(date);
            let mut plan = ctx.require_plan(date)?;
            let from = match from.or_else(|| date.pred_opt()) {
                Some(from) => from,
                None => return Err(format!("no day before {date}").into()),
            };
            let previous = ctx.require_plan(from)?;
            let selection = if indices.is_empty() {
                CarryOver::All
            } else {
                CarryOver::Indices(indices)
            };
            let carried = plan.carry_over_from(&previous, selection)?;
            ctx.store.save_plan(&plan)?;
            print_json(&serde_json::json!({ "from": from, "carried": carried }))?;
        }
        PlanAction::Unfinished { date } => {
            let plan = ctx.require_plan(day(date))?;
            let unfinished: Vec<serde_json::Value> = plan
                .unfinished()
                .into_iter()
                .map(|(index, node)| serde_json::json!({ "index": index, "name": node.name }))
                .collect();
            print_json(&unfinished)?;
        }
        PlanAction::Dates => {
            print_json(&ctx.store.plan_dates()?)?;
        }
    }
    Ok(())
}
