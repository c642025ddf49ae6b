//! Persistence: data directory, configuration and whole-document stores.
//!
//! Every document is loaded and written back in full. Writers are
//! last-writer-wins; there is no cross-process locking.

mod config;
mod json_store;
mod sqlite_store;

pub use config::{CalendarConfig, Config, PlanConfig, StorageBackend, StorageConfig};
pub use json_store::JsonStore;
pub use sqlite_store::SqliteStore;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::daily_log::DailyLog;
use crate::error::{ConfigError, CoreError, Result};
use crate::feedback::FeedbackLog;
use crate::goal::GoalBook;
use crate::plan::DayPlan;
use crate::todo::TodoList;

/// Overrides the data directory when set.
pub const DATA_DIR_ENV: &str = "PLANBOOK_DATA_DIR";
/// `dev` selects the development data directory.
pub const ENV_VAR: &str = "PLANBOOK_ENV";

/// Returns `$PLANBOOK_DATA_DIR`, or `~/.config/planbook[-dev]/` based on
/// PLANBOOK_ENV, creating it when missing.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("planbook-dev")
            } else {
                base_dir.join("planbook")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Load/save gateway for every document kind.
pub trait DocumentStore {
    /// `Ok(None)` when no plan exists for `date`.
    fn load_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>>;
    fn save_plan(&self, plan: &DayPlan) -> Result<()>;
    /// Dates that have a stored plan, ascending.
    fn plan_dates(&self) -> Result<Vec<NaiveDate>>;

    /// `Ok(None)` when no log exists for `date`.
    fn load_log(&self, date: NaiveDate) -> Result<Option<DailyLog>>;
    fn save_log(&self, log: &DailyLog) -> Result<()>;

    /// Empty collection when nothing is stored yet.
    fn load_goals(&self) -> Result<GoalBook>;
    fn save_goals(&self, goals: &GoalBook) -> Result<()>;

    /// Empty log when nothing is stored yet.
    fn load_feedback(&self) -> Result<FeedbackLog>;
    fn save_feedback(&self, feedback: &FeedbackLog) -> Result<()>;

    /// Empty list when nothing is stored yet.
    fn load_todos(&self) -> Result<TodoList>;
    fn save_todos(&self, todos: &TodoList) -> Result<()>;
}

/// Open the configured backend rooted at `dir`.
pub fn open_store(config: &Config, dir: &Path) -> Result<Box<dyn DocumentStore>> {
    tracing::debug!(backend = ?config.storage.backend, dir = %dir.display(), "opening store");
    Ok(match config.storage.backend {
        StorageBackend::Json => Box::new(JsonStore::new(dir)?),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&dir.join(SqliteStore::FILE_NAME))?),
    })
}

const GOALS_KEY: &str = "goals";
const FEEDBACK_KEY: &str = "feedback";
const TODOS_KEY: &str = "todos";

fn plan_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn decode<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| CoreError::Parse {
        what: what.to_string(),
        source,
    })
}
