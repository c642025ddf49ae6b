//! Contribution calendar: per-day aggregates bucketed into 0-4 intensity
//! levels, laid out in Sunday-aligned weeks.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::plan::DayPlan;
use crate::task::CompletionCounts;

/// Highest intensity level.
pub const MAX_INTENSITY: u8 = 4;

/// Bucket a day's completion ratio.
///
/// | ratio            | level |
/// |------------------|-------|
/// | no tasks or 0%   | 0     |
/// | (0%, 25%)        | 1     |
/// | [25%, 50%)       | 2     |
/// | [50%, 75%)       | 3     |
/// | [75%, 100%]      | 4     |
pub fn intensity_level(completed: u32, total: u32) -> u8 {
    if total == 0 || completed == 0 {
        return 0;
    }
    // Compare completed/total against the quartiles without rounding.
    let scaled = u64::from(completed) * 100;
    let total = u64::from(total);
    if scaled < 25 * total {
        1
    } else if scaled < 50 * total {
        2
    } else if scaled < 75 * total {
        3
    } else {
        MAX_INTENSITY
    }
}

/// Aggregate for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: CompletionCounts,
    /// Distinguishes "no plan" from "plan with nothing done"; both are level 0.
    pub has_plan: bool,
    pub level: u8,
}

impl DayActivity {
    pub fn from_plan(date: NaiveDate, plan: Option<&DayPlan>) -> Self {
        match plan {
            Some(plan) => {
                let counts = plan.counts();
                Self {
                    date,
                    counts,
                    has_plan: true,
                    level: intensity_level(counts.completed, counts.total),
                }
            }
            None => Self {
                date,
                counts: CompletionCounts::default(),
                has_plan: false,
                level: 0,
            },
        }
    }
}

/// One Sunday-to-Saturday column. Days after `today` are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub start: NaiveDate,
    pub days: Vec<Option<DayActivity>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub days_with_plan: u32,
    pub active_days: u32,
    pub total_completed: u32,
    pub total_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCalendar {
    pub start: NaiveDate,
    pub today: NaiveDate,
    pub weeks: Vec<CalendarWeek>,
}

impl ContributionCalendar {
    /// Every aggregated (non-future) day, oldest first.
    pub fn days(&self) -> impl Iterator<Item = &DayActivity> {
        self.weeks.iter().flat_map(|w| w.days.iter().flatten())
    }

    pub fn summary(&self) -> CalendarSummary {
        self.days().fold(CalendarSummary::default(), |mut acc, day| {
            if day.has_plan {
                acc.days_with_plan += 1;
            }
            if day.counts.completed > 0 {
                acc.active_days += 1;
            }
            acc.total_completed += day.counts.completed;
            acc.total_tasks += day.counts.total;
            acc
        })
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Build a `weeks`-column calendar whose last column holds `today`.
/// A window of zero weeks is treated as one.
pub fn build_calendar<F>(today: NaiveDate, weeks: u32, mut load: F) -> Result<ContributionCalendar>
where
    F: FnMut(NaiveDate) -> Result<Option<DayPlan>>,
{
    let weeks = weeks.max(1);
    let start = week_start(today) - Duration::weeks(i64::from(weeks - 1));

    let mut columns = Vec::with_capacity(weeks as usize);
    for w in 0..weeks {
        let column_start = start + Duration::weeks(i64::from(w));
        let mut days = Vec::with_capacity(7);
        for d in 0..7 {
            let date = column_start + Duration::days(d);
            if date > today {
                days.push(None);
                continue;
            }
            let plan = load(date)?;
            days.push(Some(DayActivity::from_plan(date, plan.as_ref())));
        }
        columns.push(CalendarWeek {
            start: column_start,
            days,
        });
    }

    tracing::debug!(%start, %today, weeks, "built contribution calendar");
    Ok(ContributionCalendar {
        start,
        today,
        weeks: columns,
    })
}

/// The last `days` days ending at `today`, oldest first.
pub fn recent_activity<F>(today: NaiveDate, days: u32, mut load: F) -> Result<Vec<DayActivity>>
where
    F: FnMut(NaiveDate) -> Result<Option<DayPlan>>,
{
    (0..i64::from(days))
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let plan = load(date)?;
            Ok(DayActivity::from_plan(date, plan.as_ref()))
        })
        .collect()
}

/// Per-day activity for one calendar month, stopping at `today`.
pub fn month_history<F>(
    year: i32,
    month: u32,
    today: NaiveDate,
    mut load: F,
) -> Result<Vec<DayActivity>>
where
    F: FnMut(NaiveDate) -> Result<Option<DayPlan>>,
{
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "month".to_string(),
            message: format!("{year}-{month} is not a calendar month"),
        }
    })?;

    let mut out = Vec::new();
    let mut date = first;
    while date.month() == month && date <= today {
        let plan = load(date)?;
        out.push(DayActivity::from_plan(date, plan.as_ref()));
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    Ok(out)
}
