//! End-of-day log: a review of each task plus a free-text summary and
//! reflection, stored per date next to the day plan.
//!
//! Only the document lives here. Text may be written by hand or come from
//! an assistant; either way it arrives as plain strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::plan::DayPlan;
use crate::task::{self, CompletionCounts, TaskNode, TaskPath, TaskStatus};

/// How one task went, with the same shape as the plan's forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReview {
    #[serde(alias = "job_name", alias = "task_name")]
    pub name: String,
    #[serde(default, alias = "completion_status")]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, alias = "sub_job_reviews", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskReview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(rename = "job_reviews")]
    pub task_reviews: Vec<TaskReview>,
    pub summary: String,
    pub reflection: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ai_generated_summary: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct DailyLogRecord {
    #[serde(default, alias = "task_reviews")]
    job_reviews: Vec<TaskReview>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    reflection: String,
    #[serde(default, alias = "ai_summary")]
    ai_generated_summary: String,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    updated_at: Option<DateTime<Utc>>,
}

/// Fields to overwrite in [`DailyLog::apply`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct LogUpdate {
    pub summary: Option<String>,
    pub reflection: Option<String>,
    pub ai_summary: Option<String>,
}

impl DailyLog {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            task_reviews: Vec::new(),
            summary: String::new(),
            reflection: String::new(),
            ai_generated_summary: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Decode the log stored under `date`. Like plans, the key's date wins
    /// over anything recorded inside.
    pub fn from_json(date: NaiveDate, raw: &str) -> Result<Self> {
        let record: DailyLogRecord = serde_json::from_str(raw).map_err(|source| CoreError::Parse {
            what: format!("daily log {date}"),
            source,
        })?;
        let summary = if record.summary.trim().is_empty() {
            record.ai_generated_summary.clone()
        } else {
            record.summary
        };
        let updated_at = record
            .updated_at
            .or_else(|| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
            .unwrap_or_else(Utc::now);
        Ok(Self {
            date,
            task_reviews: record.job_reviews,
            summary,
            reflection: record.reflection,
            ai_generated_summary: record.ai_generated_summary,
            updated_at,
        })
    }

    /// Replace the task reviews with one per node of `plan`, carrying the
    /// plan's current statuses.
    pub fn review_plan(&mut self, plan: &DayPlan) -> Result<()> {
        if plan.date != self.date {
            return Err(CoreError::InvalidState(format!(
                "plan for {} cannot be reviewed in the log for {}",
                plan.date, self.date
            )));
        }
        self.task_reviews = reviews_of(&plan.tasks, None, plan);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrite the given text fields. An assistant summary also fills an
    /// empty `summary`.
    pub fn apply(&mut self, update: LogUpdate, now: DateTime<Utc>) {
        if let Some(summary) = update.summary {
            self.summary = summary.trim().to_string();
        }
        if let Some(reflection) = update.reflection {
            self.reflection = reflection.trim().to_string();
        }
        if let Some(ai) = update.ai_summary {
            self.ai_generated_summary = ai.trim().to_string();
            if self.summary.is_empty() {
                self.summary = self.ai_generated_summary.clone();
            }
        }
        self.updated_at = now;
    }

    /// Any of summary, reflection or task reviews counts as a summary.
    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
            || !self.reflection.trim().is_empty()
            || !self.task_reviews.is_empty()
    }

    /// Status totals over every review at every depth.
    pub fn counts(&self) -> CompletionCounts {
        fn go(reviews: &[TaskReview], counts: &mut CompletionCounts) {
            for review in reviews {
                counts.record(review.status);
                go(&review.children, counts);
            }
        }
        let mut counts = CompletionCounts::default();
        go(&self.task_reviews, &mut counts);
        counts
    }
}

fn reviews_of(nodes: &[TaskNode], prefix: Option<&TaskPath>, plan: &DayPlan) -> Vec<TaskReview> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let path = match prefix {
                Some(parent) => parent.child(i),
                None => TaskPath::root(i),
            };
            TaskReview {
                name: node.name.clone(),
                status: task::status_of(&plan.completion, &path),
                notes: String::new(),
                children: reviews_of(&node.children, Some(&path), plan),
            }
        })
        .collect()
}

/// Whether the day after `previous_plan`'s date still owes a summary: a
/// plan existed but its log is missing or empty.
pub fn summary_required(previous_plan: Option<&DayPlan>, previous_log: Option<&DailyLog>) -> bool {
    previous_plan.is_some() && !previous_log.is_some_and(DailyLog::has_summary)
}
