//! Day-over-day activity streak.

use chrono::NaiveDate;

use crate::error::Result;
use crate::plan::DayPlan;

/// Count consecutive qualifying days ending at `today`.
///
/// Walks backward one day at a time and stops at the first day that has
/// no plan or whose plan has no done task. Nothing is cached; callers
/// re-run it after every status change.
pub fn calculate_streak<F>(today: NaiveDate, mut load: F) -> Result<u32>
where
    F: FnMut(NaiveDate) -> Result<Option<DayPlan>>,
{
    let mut streak = 0;
    let mut day = today;
    loop {
        match load(day)? {
            Some(plan) if plan.qualifies() => streak += 1,
            _ => break,
        }
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    tracing::debug!(%today, streak, "calculated streak");
    Ok(streak)
}
