use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use planbook_core::daily_log::summary_required;
use planbook_core::{CoreError, DailyLog, LogUpdate};

use super::{day, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum LogAction {
    /// Show a day's log
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Write summary text and task reviews for a day
    Write {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        reflection: Option<String>,
        /// Assistant-written summary (also fills an empty summary)
        #[arg(long)]
        ai_summary: Option<String>,
        /// Review every task of that day's plan with its current status
        #[arg(long)]
        from_plan: bool,
    },
    /// Whether the day before still owes a summary
    Status {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: LogAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        LogAction::Show { date } => {
            let date = day(date);
            let log = ctx
                .store
                .load_log(date)?
                .ok_or_else(|| CoreError::not_found("log", date.to_string()))?;
            print_json(&log)?;
        }
        LogAction::Write {
            date,
            summary,
            reflection,
            ai_summary,
            from_plan,
        } => {
            let date = day(date);
            let mut log = ctx.store.load_log(date)?.unwrap_or_else(|| DailyLog::new(date));
            if from_plan {
                log.review_plan(&ctx.require_plan(date)?)?;
            }
            log.apply(
                LogUpdate {
                    summary,
                    reflection,
                    ai_summary,
                },
                Utc::now(),
            );
            ctx.store.save_log(&log)?;
            print_json(&log)?;
        }
        LogAction::Status { date } => {
            let date = day(date);
            let previous = date.pred_opt();
            let (plan, log) = match previous {
                Some(previous) => (ctx.store.load_plan(previous)?, ctx.store.load_log(previous)?),
                None => (None, None),
            };
            print_json(&serde_json::json!({
                "date": previous,
                "has_plan": plan.is_some(),
                "has_summary": log.as_ref().is_some_and(DailyLog::has_summary),
                "summary_required": summary_required(plan.as_ref(), log.as_ref()),
            }))?;
        }
    }
    Ok(())
}
