//! SQLite-backed document store.
//!
//! Holds the same JSON bodies as the file store in a single
//! `documents(kind, key, body, updated_at)` table.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

use super::{decode, plan_key, DocumentStore, FEEDBACK_KEY, GOALS_KEY, TODOS_KEY};
use crate::daily_log::DailyLog;
use crate::error::Result;
use crate::feedback::FeedbackLog;
use crate::goal::GoalBook;
use crate::plan::DayPlan;
use crate::todo::TodoList;

const KIND_PLAN: &str = "plan";
const KIND_LOG: &str = "log";
const KIND_TODOS: &str = "todos";
const KIND_GOALS: &str = "goals";
const KIND_FEEDBACK: &str = "feedback";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub const FILE_NAME: &'static str = "planbook.db";

    /// Open the database at `path`, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                kind        TEXT NOT NULL,
                key         TEXT NOT NULL,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (kind, key)
            );",
        )?;
        Ok(())
    }

    fn read(&self, kind: &str, key: &str) -> Result<Option<String>> {
        let body = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE kind = ?1 AND key = ?2",
                params![kind, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(body)
    }

    fn write<T: Serialize>(&self, kind: &str, key: &str, value: &T) -> Result<()> {
        let body = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO documents (kind, key, body, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![kind, key, body, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(kind, key, "saved document");
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn load_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>> {
        match self.read(KIND_PLAN, &plan_key(date))? {
            Some(raw) => DayPlan::from_json(date, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn save_plan(&self, plan: &DayPlan) -> Result<()> {
        self.write(KIND_PLAN, &plan_key(plan.date), plan)
    }

    fn plan_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM documents WHERE kind = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![KIND_PLAN], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys
            .iter()
            .filter_map(|k| NaiveDate::parse_from_str(k, "%Y-%m-%d").ok())
            .collect())
    }

    fn load_log(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        match self.read(KIND_LOG, &plan_key(date))? {
            Some(raw) => DailyLog::from_json(date, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn save_log(&self, log: &DailyLog) -> Result<()> {
        self.write(KIND_LOG, &plan_key(log.date), log)
    }

    fn load_goals(&self) -> Result<GoalBook> {
        match self.read(KIND_GOALS, GOALS_KEY)? {
            Some(raw) => decode(GOALS_KEY, &raw),
            None => Ok(GoalBook::new()),
        }
    }

    fn save_goals(&self, goals: &GoalBook) -> Result<()> {
        self.write(KIND_GOALS, GOALS_KEY, goals)
    }

    fn load_feedback(&self) -> Result<FeedbackLog> {
        match self.read(KIND_FEEDBACK, FEEDBACK_KEY)? {
            Some(raw) => decode(FEEDBACK_KEY, &raw),
            None => Ok(FeedbackLog::default()),
        }
    }

    fn save_feedback(&self, feedback: &FeedbackLog) -> Result<()> {
        self.write(KIND_FEEDBACK, FEEDBACK_KEY, feedback)
    }

    fn load_todos(&self) -> Result<TodoList> {
        match self.read(KIND_TODOS, TODOS_KEY)? {
            Some(raw) => decode(TODOS_KEY, &raw),
            None => Ok(TodoList::new()),
        }
    }

    fn save_todos(&self, todos: &TodoList) -> Result<()> {
        self.write(KIND_TODOS, TODOS_KEY, todos)
    }
}
