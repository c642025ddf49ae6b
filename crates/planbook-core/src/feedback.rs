//! Improvement-suggestion queue with a bounded pending collection.
//!
//! Entries start `pending`, may be resolved to `implemented` or `dismissed`
//! in place, and are then archived in a separate step. Archiving is one-way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, Result, ValidationError};

/// Maximum number of entries in `pending` status.
pub const PENDING_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    #[default]
    Pending,
    Implemented,
    Dismissed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Implemented => "implemented",
            FeedbackStatus::Dismissed => "dismissed",
        }
    }

    /// Whether an entry in this status may be archived.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, FeedbackStatus::Pending)
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(FeedbackStatus::Pending),
            "implemented" => Ok(FeedbackStatus::Implemented),
            "dismissed" => Ok(FeedbackStatus::Dismissed),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown feedback status '{other}'"),
            }),
        }
    }
}

/// One clarification round between the user and the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderstandingRound {
    #[serde(default)]
    pub user_input: String,
    #[serde(default, alias = "understanding")]
    pub ai_understanding: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Nil in older documents until [`FeedbackLog`] decoding assigns one.
    #[serde(default)]
    pub id: Uuid,
    #[serde(
        alias = "date",
        default = "unknown_submission",
        deserialize_with = "crate::timestamp::deserialize"
    )]
    pub submitted_at: DateTime<Utc>,
    #[serde(alias = "original_feedback")]
    pub original_text: String,
    #[serde(default)]
    pub final_understanding: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub understanding_history: Vec<UnderstandingRound>,
    #[serde(default)]
    pub status: FeedbackStatus,
    #[serde(
        default,
        deserialize_with = "crate::timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub archived_at: Option<DateTime<Utc>>,
}

fn unknown_submission() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl FeedbackEntry {
    /// Stable id for an entry stored without one, derived from its
    /// collection, position, timestamp and text so every load agrees.
    fn legacy_id(&self, collection: &str, index: usize) -> Uuid {
        let name = format!(
            "{collection}/{index}/{}/{}",
            self.submitted_at.to_rfc3339(),
            self.original_text
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }
}

/// Input for [`FeedbackLog::submit`].
#[derive(Debug, Clone, Default)]
pub struct FeedbackDraft {
    pub original_text: String,
    /// Defaults to the original text.
    pub final_understanding: Option<String>,
    pub understanding_history: Vec<UnderstandingRound>,
}

impl FeedbackDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            original_text: text.into(),
            ..Self::default()
        }
    }
}

/// Pending and archived feedback. The two collections never share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FeedbackLogRecord")]
pub struct FeedbackLog {
    pub pending: Vec<FeedbackEntry>,
    pub archived: Vec<FeedbackEntry>,
}

#[derive(Deserialize)]
struct FeedbackLogRecord {
    #[serde(default, alias = "feedback_entries")]
    pending: Vec<FeedbackEntry>,
    #[serde(default)]
    archived: Vec<FeedbackEntry>,
}

impl From<FeedbackLogRecord> for FeedbackLog {
    fn from(record: FeedbackLogRecord) -> Self {
        Self {
            pending: normalize("pending", record.pending),
            archived: normalize("archived", record.archived),
        }
    }
}

fn normalize(collection: &str, entries: Vec<FeedbackEntry>) -> Vec<FeedbackEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, mut entry)| {
            if entry.id.is_nil() {
                entry.id = entry.legacy_id(collection, index);
            }
            if entry.final_understanding.is_empty() {
                entry.final_understanding = entry.original_text.clone();
            }
            entry
        })
        .collect()
}

impl FeedbackLog {
    /// Entries in the pending collection still awaiting a decision.
    pub fn pending_count(&self) -> usize {
        self.pending
            .iter()
            .filter(|e| e.status == FeedbackStatus::Pending)
            .count()
    }

    pub fn get(&self, id: Uuid) -> Result<&FeedbackEntry> {
        self.pending
            .iter()
            .chain(&self.archived)
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::not_found("feedback", id.to_string()))
    }

    pub fn submit(&mut self, draft: FeedbackDraft, now: DateTime<Utc>) -> Result<FeedbackEntry> {
        let text = draft.original_text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("feedback".to_string()).into());
        }
        if self.pending_count() >= PENDING_CAPACITY {
            return Err(CoreError::CapacityExceeded {
                what: "pending feedback",
                limit: PENDING_CAPACITY,
            });
        }
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            submitted_at: now,
            original_text: text.to_string(),
            final_understanding: draft
                .final_understanding
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| text.to_string()),
            understanding_history: draft.understanding_history,
            status: FeedbackStatus::Pending,
            archived_at: None,
        };
        self.pending.push(entry.clone());
        tracing::debug!(id = %entry.id, "submitted feedback");
        Ok(entry)
    }

    /// Change the status of a pending-collection entry. Does not archive.
    pub fn set_status(&mut self, id: Uuid, status: FeedbackStatus) -> Result<()> {
        if let Some(entry) = self.pending.iter_mut().find(|e| e.id == id) {
            entry.status = status;
            return Ok(());
        }
        if self.archived.iter().any(|e| e.id == id) {
            return Err(CoreError::InvalidState(format!(
                "feedback {id} is archived and can no longer change"
            )));
        }
        Err(CoreError::not_found("feedback", id.to_string()))
    }

    /// Move a resolved entry to the archive and stamp `archived_at`.
    pub fn archive(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<FeedbackEntry> {
        let Some(index) = self.pending.iter().position(|e| e.id == id) else {
            if self.archived.iter().any(|e| e.id == id) {
                return Err(CoreError::InvalidState(format!("feedback {id} is already archived")));
            }
            return Err(CoreError::not_found("feedback", id.to_string()));
        };
        let status = self.pending[index].status;
        if !status.is_resolved() {
            return Err(CoreError::InvalidState(format!(
                "feedback {id} is {status}; mark it implemented or dismissed before archiving"
            )));
        }
        let mut entry = self.pending.remove(index);
        entry.archived_at = Some(now);
        self.archived.push(entry.clone());
        tracing::info!(%id, %status, "archived feedback");
        Ok(entry)
    }

    /// Remove an entry from whichever collection holds it.
    pub fn delete(&mut self, id: Uuid) -> Result<FeedbackEntry> {
        for collection in [&mut self.pending, &mut self.archived] {
            if let Some(index) = collection.iter().position(|e| e.id == id) {
                return Ok(collection.remove(index));
            }
        }
        Err(CoreError::not_found("feedback", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn full_log() -> FeedbackLog {
        let mut log = FeedbackLog::default();
        for i in 0..PENDING_CAPACITY {
            log.submit(FeedbackDraft::new(format!("idea {i}")), now()).unwrap();
        }
        log
    }

    #[test]
    fn eleventh_submission_is_rejected() {
        let mut log = full_log();
        let err = log.submit(FeedbackDraft::new("one more"), now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CapacityExceeded {
                limit: PENDING_CAPACITY,
                ..
            }
        ));
        assert_eq!(log.pending.len(), PENDING_CAPACITY);
    }

    #[test]
    fn archiving_frees_a_slot() {
        let mut log = full_log();
        let id = log.pending[3].id;
        log.set_status(id, FeedbackStatus::Implemented).unwrap();
        let archived = log.archive(id, now()).unwrap();
        assert_eq!(archived.archived_at, Some(now()));
        assert_eq!(log.pending.len(), PENDING_CAPACITY - 1);
        assert!(log.submit(FeedbackDraft::new("room now"), now()).is_ok());
    }

    #[test]
    fn archiving_pending_entry_is_rejected() {
        let mut log = FeedbackLog::default();
        let entry = log.submit(FeedbackDraft::new("idea"), now()).unwrap();
        assert!(matches!(
            log.archive(entry.id, now()),
            Err(CoreError::InvalidState(_))
        ));
        assert_eq!(log.pending.len(), 1);
        assert!(log.archived.is_empty());
    }

    #[test]
    fn archived_entries_are_frozen() {
        let mut log = FeedbackLog::default();
        let entry = log.submit(FeedbackDraft::new("idea"), now()).unwrap();
        log.set_status(entry.id, FeedbackStatus::Dismissed).unwrap();
        log.archive(entry.id, now()).unwrap();
        assert!(matches!(
            log.set_status(entry.id, FeedbackStatus::Pending),
            Err(CoreError::InvalidState(_))
        ));
        assert!(matches!(log.archive(entry.id, now()), Err(CoreError::InvalidState(_))));
        assert_eq!(log.get(entry.id).unwrap().status, FeedbackStatus::Dismissed);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut log = FeedbackLog::default();
        let id = Uuid::new_v4();
        assert!(log.get(id).unwrap_err().is_not_found());
        assert!(log.set_status(id, FeedbackStatus::Dismissed).unwrap_err().is_not_found());
        assert!(log.archive(id, now()).unwrap_err().is_not_found());
        assert!(log.delete(id).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_removes_from_either_collection() {
        let mut log = FeedbackLog::default();
        let a = log.submit(FeedbackDraft::new("a"), now()).unwrap();
        let b = log.submit(FeedbackDraft::new("b"), now()).unwrap();
        log.set_status(b.id, FeedbackStatus::Implemented).unwrap();
        log.archive(b.id, now()).unwrap();
        log.delete(a.id).unwrap();
        log.delete(b.id).unwrap();
        assert!(log.pending.is_empty());
        assert!(log.archived.is_empty());
    }

    #[test]
    fn understanding_defaults_to_original_text() {
        let mut log = FeedbackLog::default();
        let entry = log.submit(FeedbackDraft::new("  faster startup "), now()).unwrap();
        assert_eq!(entry.original_text, "faster startup");
        assert_eq!(entry.final_understanding, "faster startup");
        assert!(log.submit(FeedbackDraft::new("   "), now()).is_err());
    }

    #[test]
    fn legacy_document_loads_as_pending() {
        let log: FeedbackLog = serde_json::from_str(
            r#"{"feedback_entries": [{
                "date": "2024-04-02T10:00:00.123456",
                "original_feedback": "dark mode",
                "understanding_history": [
                    {"user_input": "dark mode", "ai_understanding": "Add a dark theme"}
                ],
                "status": "implemented"
            }]}"#,
        )
        .unwrap();
        assert_eq!(log.pending.len(), 1);
        let entry = &log.pending[0];
        assert_eq!(entry.original_text, "dark mode");
        assert_eq!(entry.final_understanding, "dark mode");
        assert_eq!(entry.understanding_history[0].ai_understanding, "Add a dark theme");
        assert_eq!(entry.status, FeedbackStatus::Implemented);
        assert!(!entry.id.is_nil());
    }

    #[test]
    fn entries_without_id_get_the_same_id_on_every_load() {
        let raw = r#"{"feedback_entries": [
            {"date": "2024-04-02T10:00:00", "original_feedback": "dark mode"},
            {"date": "2024-04-02T10:00:00", "original_feedback": "dark mode"}
        ]}"#;
        let first: FeedbackLog = serde_json::from_str(raw).unwrap();
        let second: FeedbackLog = serde_json::from_str(raw).unwrap();
        assert_eq!(first.pending[0].id, second.pending[0].id);
        assert_ne!(first.pending[0].id, first.pending[1].id);

        let mut log = second;
        log.set_status(first.pending[1].id, FeedbackStatus::Dismissed).unwrap();
        let saved = serde_json::to_string(&log).unwrap();
        let reloaded: FeedbackLog = serde_json::from_str(&saved).unwrap();
        assert_eq!(reloaded.get(first.pending[1].id).unwrap().status, FeedbackStatus::Dismissed);
    }

    #[test]
    fn understanding_rounds_use_ai_understanding_on_disk() {
        let round = UnderstandingRound {
            user_input: "dark mode".into(),
            ai_understanding: "Add a dark theme".into(),
        };
        let value = serde_json::to_value(&round).unwrap();
        assert_eq!(value["ai_understanding"], "Add a dark theme");
        assert!(value.get("understanding").is_none());

        let older: UnderstandingRound =
            serde_json::from_str(r#"{"user_input": "x", "understanding": "y"}"#).unwrap();
        assert_eq!(older.ai_understanding, "y");
    }

    #[test]
    fn round_trip_preserves_both_collections() {
        let mut log = FeedbackLog::default();
        let a = log.submit(FeedbackDraft::new("a"), now()).unwrap();
        log.submit(FeedbackDraft::new("b"), now()).unwrap();
        log.set_status(a.id, FeedbackStatus::Dismissed).unwrap();
        log.archive(a.id, now()).unwrap();

        let json = serde_json::to_string(&log).unwrap();
        let back: FeedbackLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
