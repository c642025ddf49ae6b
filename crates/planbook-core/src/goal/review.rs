//! Periodic goal reviews.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{GoalId, Progress};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Weekly,
    Monthly,
    Yearly,
}

impl ReviewKind {
    pub const ALL: [ReviewKind; 3] = [ReviewKind::Weekly, ReviewKind::Monthly, ReviewKind::Yearly];

    /// Time between two reviews of this kind.
    pub fn interval(&self) -> Duration {
        match self {
            ReviewKind::Weekly => Duration::days(7),
            ReviewKind::Monthly => Duration::days(30),
            ReviewKind::Yearly => Duration::days(365),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Weekly => "weekly",
            ReviewKind::Monthly => "monthly",
            ReviewKind::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(ReviewKind::Weekly),
            "monthly" => Ok(ReviewKind::Monthly),
            "yearly" => Ok(ReviewKind::Yearly),
            other => Err(ValidationError::InvalidValue {
                field: "review".to_string(),
                message: format!("unknown review kind '{other}'"),
            }),
        }
    }
}

/// How much closer a goal got since the last review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Closeness {
    Great,
    Steady,
    #[default]
    Same,
    Behind,
    Rethink,
}

impl FromStr for Closeness {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "great" => Ok(Closeness::Great),
            "steady" => Ok(Closeness::Steady),
            "same" => Ok(Closeness::Same),
            "behind" => Ok(Closeness::Behind),
            "rethink" => Ok(Closeness::Rethink),
            other => Err(ValidationError::InvalidValue {
                field: "closer".to_string(),
                message: format!("unknown answer '{other}'"),
            }),
        }
    }
}

/// One goal's answers within a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub goal_id: GoalId,
    #[serde(default)]
    pub goal_name: String,
    #[serde(default)]
    pub progress_before: Progress,
    #[serde(default)]
    pub progress_after: Progress,
    #[serde(default)]
    pub done: String,
    #[serde(default)]
    pub not_done: String,
    #[serde(default)]
    pub closer: Closeness,
    #[serde(default)]
    pub next_actions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReview {
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    #[serde(default, alias = "goals")]
    pub entries: Vec<ReviewEntry>,
    #[serde(default)]
    pub overall: String,
}

impl GoalReview {
    pub fn new(kind: ReviewKind, date: DateTime<Utc>) -> Self {
        Self {
            date,
            kind,
            entries: Vec::new(),
            overall: String::new(),
        }
    }
}
