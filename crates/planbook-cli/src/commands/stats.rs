use chrono::NaiveDate;
use clap::Subcommand;
use planbook_core::calendar::DayActivity;
use planbook_core::calculate_streak;

use super::{day, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Completion counts for one day
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Consecutive days with at least one done task
    Streak {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        StatsAction::Today { date } => {
            let date = day(date);
            let plan = ctx.store.load_plan(date)?;
            let activity = DayActivity::from_plan(date, plan.as_ref());
            print_json(&activity)?;
        }
        StatsAction::Streak { date } => {
            let date = day(date);
            let streak = calculate_streak(date, |d| ctx.store.load_plan(d))?;
            print_json(&serde_json::json!({ "date": date, "streak": streak }))?;
        }
    }
    Ok(())
}
