use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use planbook_core::calendar::{build_calendar, month_history, recent_activity, ContributionCalendar};

use super::{day, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Contribution grid ending at today
    Show {
        /// Number of week columns (default calendar.weeks)
        #[arg(long)]
        weeks: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of the grid
        #[arg(long)]
        json: bool,
    },
    /// Per-day activity for the recent window (default calendar.recent_weeks)
    Recent {
        #[arg(long)]
        weeks: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Per-day activity for one month
    Month {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// 1-12, defaults to the current month
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

const LEVEL_GLYPHS: [char; 5] = ['.', '░', '▒', '▓', '█'];
const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Seven rows (Sunday first), one column per week.
fn render(calendar: &ContributionCalendar) -> String {
    let mut out = String::new();
    for (row, label) in WEEKDAYS.iter().enumerate() {
        out.push_str(label);
        out.push(' ');
        for week in &calendar.weeks {
            let glyph = match week.days.get(row).and_then(Option::as_ref) {
                Some(activity) => LEVEL_GLYPHS[usize::from(activity.level).min(LEVEL_GLYPHS.len() - 1)],
                None => ' ',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    let summary = calendar.summary();
    out.push_str(&format!(
        "{} to {}: {} active days, {}/{} tasks done\n",
        calendar.start, calendar.today, summary.active_days, summary.total_completed, summary.total_tasks
    ));
    out
}

pub fn run(action: CalendarAction) -> CmdResult {
    let ctx = Context::open()?;
    let load = |d| ctx.store.load_plan(d);

    match action {
        CalendarAction::Show { weeks, date, json } => {
            let weeks = weeks.unwrap_or(ctx.config.calendar.weeks);
            let calendar = build_calendar(day(date), weeks, load)?;
            if json {
                print_json(&calendar)?;
            } else {
                print!("{}", render(&calendar));
            }
        }
        CalendarAction::Recent { weeks, date } => {
            let weeks = weeks.unwrap_or(ctx.config.calendar.recent_weeks);
            let days = recent_activity(day(date), weeks.saturating_mul(7), load)?;
            print_json(&days)?;
        }
        CalendarAction::Month { year, month, date } => {
            let today = day(date);
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let days = month_history(year, month, today, load)?;
            print_json(&days)?;
        }
    }
    Ok(())
}
