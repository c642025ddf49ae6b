//! Deadline to-do list, kept apart from day plans.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{CoreError, Result, ValidationError};
use crate::goal::days_remaining;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize_date")]
    pub deadline: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now", deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Negative once the deadline has passed.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        days_remaining(self.deadline, today)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline < today
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TodoListRecord")]
pub struct TodoList {
    pub todos: Vec<Todo>,
    /// Never reused, even after deletes.
    next_id: u64,
}

#[derive(Deserialize)]
struct TodoListRecord {
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default)]
    next_id: Option<u64>,
}

impl From<TodoListRecord> for TodoList {
    fn from(record: TodoListRecord) -> Self {
        // Older lists numbered entries by position, so ids can repeat after
        // a delete. The first holder keeps the id; later ones get fresh ones.
        let highest = record.todos.iter().map(|t| t.id).max();
        let mut next_id = record
            .next_id
            .unwrap_or(0)
            .max(highest.map_or(1, |h| h + 1));
        let mut seen = BTreeSet::new();
        let todos = record
            .todos
            .into_iter()
            .map(|mut todo| {
                if !seen.insert(todo.id) {
                    todo.id = next_id;
                    next_id += 1;
                    seen.insert(todo.id);
                }
                todo
            })
            .collect();
        Self { todos, next_id }
    }
}

impl TodoList {
    pub fn new() -> Self {
        Self {
            todos: Vec::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: u64) -> Result<&Todo> {
        self.todos
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("todo", id.to_string()))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Todo> {
        self.todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("todo", id.to_string()))
    }

    pub fn add(&mut self, title: &str, deadline: NaiveDate, now: DateTime<Utc>) -> Result<Todo> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".to_string()).into());
        }
        let todo = Todo {
            id: self.next_id.max(1),
            title: title.to_string(),
            deadline,
            completed: false,
            completed_at: None,
            created_at: now,
        };
        self.next_id = todo.id + 1;
        self.todos.push(todo.clone());
        tracing::debug!(id = todo.id, "added todo");
        Ok(todo)
    }

    /// Flip completion and return the new state. Completing stamps
    /// `completed_at`; reopening clears it.
    pub fn toggle(&mut self, id: u64, now: DateTime<Utc>) -> Result<bool> {
        let todo = self.get_mut(id)?;
        todo.completed = !todo.completed;
        todo.completed_at = todo.completed.then_some(now);
        Ok(todo.completed)
    }

    pub fn delete(&mut self, id: u64) -> Result<Todo> {
        let index = self
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("todo", id.to_string()))?;
        Ok(self.todos.remove(index))
    }

    /// Open items first, each group by nearest deadline.
    pub fn sorted(&self) -> Vec<&Todo> {
        let mut todos: Vec<&Todo> = self.todos.iter().collect();
        todos.sort_by_key(|t| (t.completed, t.deadline, t.id));
        todos
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Todo> {
        self.sorted()
            .into_iter()
            .filter(|t| t.is_overdue(today))
            .collect()
    }
}
