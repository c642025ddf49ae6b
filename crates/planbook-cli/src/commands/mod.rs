pub mod calendar;
pub mod config;
pub mod feedback;
pub mod goal;
pub mod log;
pub mod plan;
pub mod stats;
pub mod task;
pub mod todo;

use chrono::{Local, NaiveDate};
use planbook_core::storage::{data_dir, open_store, Config, DocumentStore};
use planbook_core::{CoreError, DayPlan};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded config and the store it selects.
pub struct Context {
    pub config: Config,
    pub store: Box<dyn DocumentStore>,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = data_dir()?;
        let config = Config::load_from(&Config::path_in(&dir))?;
        let store = open_store(&config, &dir)?;
        tracing::debug!(dir = %dir.display(), "opened context");
        Ok(Self { config, store })
    }

    /// The plan for `date`, or NotFound.
    pub fn require_plan(&self, date: NaiveDate) -> Result<DayPlan, CoreError> {
        self.store
            .load_plan(date)?
            .ok_or_else(|| CoreError::not_found("plan", date.to_string()))
    }
}

/// `--date` when given, otherwise the local calendar date.
pub fn day(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
