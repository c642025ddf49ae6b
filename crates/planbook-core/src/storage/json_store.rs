//! One pretty-printed JSON file per document.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{decode, plan_key, DocumentStore, FEEDBACK_KEY, GOALS_KEY, TODOS_KEY};
use crate::daily_log::DailyLog;
use crate::error::Result;
use crate::feedback::FeedbackLog;
use crate::goal::GoalBook;
use crate::plan::DayPlan;
use crate::todo::TodoList;

const PLAN_SUFFIX: &str = "-plan.json";
const LOG_SUFFIX: &str = "-log.json";
/// Older installs kept feedback under this name.
const LEGACY_FEEDBACK_FILE: &str = "tool_feedback.json";

/// Documents stored as `YYYY-MM-DD-plan.json`, `YYYY-MM-DD-log.json`,
/// `goals.json`, `feedback.json` and `todos.json` inside one directory.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Use `dir`, creating it when missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn plan_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}{PLAN_SUFFIX}", plan_key(date)))
    }

    fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}{LOG_SUFFIX}", plan_key(date)))
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace `path` as a whole: write a sibling temp file, then rename.
    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "saved document");
        Ok(())
    }
}

impl DocumentStore for JsonStore {
    fn load_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>> {
        match self.read(&self.plan_path(date))? {
            Some(raw) => DayPlan::from_json(date, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn save_plan(&self, plan: &DayPlan) -> Result<()> {
        self.write(&self.plan_path(plan.date), plan)
    }

    fn plan_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(PLAN_SUFFIX) else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    fn load_log(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        match self.read(&self.log_path(date))? {
            Some(raw) => DailyLog::from_json(date, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn save_log(&self, log: &DailyLog) -> Result<()> {
        self.write(&self.log_path(log.date), log)
    }

    fn load_goals(&self) -> Result<GoalBook> {
        match self.read(&self.dir.join(format!("{GOALS_KEY}.json")))? {
            Some(raw) => decode(GOALS_KEY, &raw),
            None => Ok(GoalBook::new()),
        }
    }

    fn save_goals(&self, goals: &GoalBook) -> Result<()> {
        self.write(&self.dir.join(format!("{GOALS_KEY}.json")), goals)
    }

    fn load_feedback(&self) -> Result<FeedbackLog> {
        let current = self.read(&self.dir.join(format!("{FEEDBACK_KEY}.json")))?;
        let raw = match current {
            Some(raw) => Some(raw),
            None => self.read(&self.dir.join(LEGACY_FEEDBACK_FILE))?,
        };
        match raw {
            Some(raw) => decode(FEEDBACK_KEY, &raw),
            None => Ok(FeedbackLog::default()),
        }
    }

    fn save_feedback(&self, feedback: &FeedbackLog) -> Result<()> {
        self.write(&self.dir.join(format!("{FEEDBACK_KEY}.json")), feedback)
    }

    fn load_todos(&self) -> Result<TodoList> {
        match self.read(&self.dir.join(format!("{TODOS_KEY}.json")))? {
            Some(raw) => decode(TODOS_KEY, &raw),
            None => Ok(TodoList::new()),
        }
    }

    fn save_todos(&self, todos: &TodoList) -> Result<()> {
        self.write(&self.dir.join(format!("{TODOS_KEY}.json")), todos)
    }
}
