//! # Planbook Core Library
//!
//! This library provides the core logic for the planbook daily planner and
//! goal tracker. Every operation is available through the `planbook` CLI,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Task tree**: each day holds a forest of nested tasks with a tri-state
//!   completion map keyed by positional path
//! - **Streak & calendar**: day-over-day streak and a contribution-style
//!   calendar computed on demand from stored plans
//! - **Goals**: long-lived goals with four progress stages, dotted sub-goal
//!   ids and periodic reviews
//! - **Daily log & to-dos**: end-of-day reviews per date and a deadline list
//! - **Feedback**: a bounded queue of improvement suggestions
//! - **Storage**: whole-document JSON files or SQLite, plus TOML configuration
//!
//! ## Key Components
//!
//! - [`DayPlan`]: one date's task forest and completion map
//! - [`GoalBook`]: goal collection with its id generator
//! - [`FeedbackLog`]: pending and archived feedback
//! - [`DocumentStore`]: load/save gateway implemented by [`JsonStore`] and [`SqliteStore`]

pub mod calendar;
pub mod daily_log;
pub mod error;
pub mod feedback;
pub mod goal;
pub mod plan;
pub mod storage;
pub mod streak;
pub mod task;
pub mod timestamp;
pub mod todo;

pub use calendar::{build_calendar, intensity_level, month_history, recent_activity, ContributionCalendar, DayActivity};
pub use daily_log::{DailyLog, LogUpdate, TaskReview};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use feedback::{FeedbackDraft, FeedbackEntry, FeedbackLog, FeedbackStatus, PENDING_CAPACITY};
pub use goal::{stage_of, time_progress, Goal, GoalBook, GoalId, GoalStatus, NewGoal, Progress, Stage};
pub use plan::{CarryOver, DayPlan};
pub use storage::{data_dir, open_store, Config, DocumentStore, JsonStore, SqliteStore};
pub use streak::calculate_streak;
pub use task::{aggregate, CompletionCounts, TaskNode, TaskPath, TaskStatus};
pub use todo::{Todo, TodoList};
