//! Long-lived goals tracked through four qualitative stages.
//!
//! A goal's stage is a pure function of its user-set progress. Goals with
//! a deadline additionally report how much of their time window has
//! elapsed; the two numbers are kept apart and never blended.

mod book;
pub mod review;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use book::{GoalBook, NewGoal, ProgressUpdate, MAX_GOAL_DEPTH};
pub use review::{Closeness, GoalReview, ReviewEntry, ReviewKind};

/// Progress band of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 0-10: starting with good intentions
    Positive,
    /// 11-30: struggle phase
    Negative,
    /// 31-50: working through it
    Current,
    /// 51-100: getting better
    Improve,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Positive, Stage::Negative, Stage::Current, Stage::Improve];

    pub fn index(&self) -> usize {
        match self {
            Stage::Positive => 0,
            Stage::Negative => 1,
            Stage::Current => 2,
            Stage::Improve => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Positive => "Positive",
            Stage::Negative => "Negative",
            Stage::Current => "Current",
            Stage::Improve => "Improve",
        }
    }

    /// Inclusive progress bounds of the band.
    pub fn bounds(&self) -> (u8, u8) {
        match self {
            Stage::Positive => (0, 10),
            Stage::Negative => (11, 30),
            Stage::Current => (31, 50),
            Stage::Improve => (51, 100),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage for a progress value. Upper bounds are inclusive.
pub fn stage_of(progress: u8) -> Stage {
    match progress {
        0..=10 => Stage::Positive,
        11..=30 => Stage::Negative,
        31..=50 => Stage::Current,
        _ => Stage::Improve,
    }
}

/// User-set progress, always within 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Progress(u8);

impl Progress {
    pub const COMPLETE: Progress = Progress(100);

    pub fn new(value: u32) -> Result<Self, ValidationError> {
        Self::try_from(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn stage(self) -> Stage {
        stage_of(self.0)
    }

    pub fn is_complete(self) -> bool {
        self.0 >= 100
    }
}

impl TryFrom<u32> for Progress {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Progress(v)),
            _ => Err(ValidationError::ProgressOutOfRange(value)),
        }
    }
}

impl From<Progress> for u32 {
    fn from(progress: Progress) -> Self {
        u32::from(progress.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Share of the window between `created_at` and the start of `deadline`
/// that has elapsed at `now`, clamped to 0..=100.
pub fn time_progress(created_at: DateTime<Utc>, deadline: NaiveDate, now: DateTime<Utc>) -> u8 {
    let Some(deadline_at) = deadline.and_hms_opt(0, 0, 0).map(|d| d.and_utc()) else {
        return 0;
    };
    let span = (deadline_at - created_at).num_seconds();
    if span <= 0 {
        return if now >= deadline_at { 100 } else { 0 };
    }
    let elapsed = (now - created_at).num_seconds();
    let pct = elapsed as f64 / span as f64 * 100.0;
    pct.clamp(0.0, 100.0) as u8
}

/// Whole calendar days until `deadline`; negative when overdue.
pub fn days_remaining(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

/// Dotted goal identifier: `3` for a top-level goal, `3.1` and `3.1.2` for
/// its descendants. Depth is the number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId(String);

impl GoalId {
    pub fn root(n: u64) -> Self {
        GoalId(n.to_string())
    }

    pub fn child(&self, n: u64) -> Self {
        GoalId(format!("{}.{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }

    pub fn is_root(&self) -> bool {
        self.depth() == 1
    }

    pub fn parent(&self) -> Option<GoalId> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| GoalId(parent.to_string()))
    }

    /// Numeric value of the last segment.
    pub fn last_index(&self) -> u64 {
        self.0
            .rsplit('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Numeric value of the first segment.
    pub fn root_index(&self) -> u64 {
        self.0
            .split('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// `3.1.2` yields `3`, `3.1`, `3.1.2`.
    pub fn prefixes(&self) -> Vec<GoalId> {
        let mut out = Vec::with_capacity(self.depth());
        let mut current = String::new();
        for segment in self.0.split('.') {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(segment);
            out.push(GoalId(current.clone()));
        }
        out
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GoalId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.split('.')
                .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()));
        if !valid {
            return Err(ValidationError::InvalidGoalId(s.to_string()));
        }
        Ok(GoalId(s.to_string()))
    }
}

impl Serialize for GoalId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GoalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Top-level ids were once written as bare integers.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(GoalId::root(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    #[default]
    LongTerm,
    Yearly,
    Monthly,
    Weekly,
}

impl FromStr for GoalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "long_term" => Ok(GoalType::LongTerm),
            "yearly" => Ok(GoalType::Yearly),
            "monthly" => Ok(GoalType::Monthly),
            "weekly" => Ok(GoalType::Weekly),
            other => Err(ValidationError::InvalidValue {
                field: "type".to_string(),
                message: format!("unknown goal type '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl FromStr for GoalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "archived" => Ok(GoalStatus::Archived),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown goal status '{other}'"),
            }),
        }
    }
}

/// What each stage means for one particular goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptions {
    #[serde(default = "default_positive")]
    pub positive: String,
    #[serde(default = "default_negative")]
    pub negative: String,
    #[serde(default = "default_current")]
    pub current: String,
    #[serde(default = "default_improve")]
    pub improve: String,
}

fn default_positive() -> String {
    "Starting with good intentions".to_string()
}
fn default_negative() -> String {
    "Facing challenges".to_string()
}
fn default_current() -> String {
    "Making progress".to_string()
}
fn default_improve() -> String {
    "Building momentum".to_string()
}

impl Default for StageDescriptions {
    fn default() -> Self {
        Self {
            positive: default_positive(),
            negative: default_negative(),
            current: default_current(),
            improve: default_improve(),
        }
    }
}

impl StageDescriptions {
    pub fn describe(&self, stage: Stage) -> &str {
        match stage {
            Stage::Positive => &self.positive,
            Stage::Negative => &self.negative,
            Stage::Current => &self.current,
            Stage::Improve => &self.improve,
        }
    }
}

/// A goal or sub-goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub goal_type: GoalType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "Utc::now", deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_date_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, alias = "stages")]
    pub stage_descriptions: StageDescriptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_goals: Vec<Goal>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn new(id: GoalId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            goal_type: GoalType::default(),
            priority: Priority::default(),
            created_at,
            deadline: None,
            status: GoalStatus::Active,
            progress: Progress::default(),
            stage_descriptions: StageDescriptions::default(),
            sub_goals: Vec::new(),
            completed_at: None,
            last_updated: None,
            archived_at: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.progress.stage()
    }

    pub fn depth(&self) -> usize {
        self.id.depth()
    }

    /// Elapsed share of the deadline window, when there is one.
    pub fn time_progress(&self, now: DateTime<Utc>) -> Option<u8> {
        self.deadline
            .map(|deadline| time_progress(self.created_at, deadline, now))
    }

    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.deadline.map(|deadline| days_remaining(deadline, today))
    }
}

/// Read model of a goal with its time-based figures filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    pub id: GoalId,
    pub name: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub priority: Priority,
    pub status: GoalStatus,
    pub progress: Progress,
    pub stage: Stage,
    pub stage_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    /// Elapsed share of the deadline window; goals without a deadline
    /// report their user progress here.
    pub time_progress: u8,
    pub days_remaining: Option<i64>,
    pub sub_goals: Vec<GoalView>,
}

impl GoalView {
    pub fn of(goal: &Goal, now: DateTime<Utc>) -> Self {
        let stage = goal.stage();
        Self {
            id: goal.id.clone(),
            name: goal.name.clone(),
            goal_type: goal.goal_type,
            priority: goal.priority,
            status: goal.status,
            progress: goal.progress,
            stage,
            stage_description: goal.stage_descriptions.describe(stage).to_string(),
            deadline: goal.deadline,
            time_progress: goal
                .time_progress(now)
                .unwrap_or_else(|| goal.progress.value()),
            days_remaining: goal.days_remaining(now.date_naive()),
            sub_goals: goal.sub_goals.iter().map(|s| GoalView::of(s, now)).collect(),
        }
    }
}
