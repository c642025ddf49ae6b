//! The goal collection: active goals, the archive and review history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::review::{GoalReview, ReviewKind};
use super::{Goal, GoalId, GoalStatus, GoalType, GoalView, Priority, Progress, Stage, StageDescriptions};
use crate::error::{CoreError, Result, ValidationError};

/// Deepest allowed goal id, counted in dotted segments.
pub const MAX_GOAL_DEPTH: usize = 3;

/// Input for [`GoalBook::add_goal`].
#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub name: String,
    pub goal_type: GoalType,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    pub stage_descriptions: Option<StageDescriptions>,
}

impl NewGoal {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Result of a progress change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub id: GoalId,
    pub before: Progress,
    pub after: Progress,
    pub stage_before: Stage,
    pub stage_after: Stage,
    pub can_complete: bool,
}

impl ProgressUpdate {
    pub fn stage_changed(&self) -> bool {
        self.stage_before != self.stage_after
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GoalBookRecord")]
pub struct GoalBook {
    pub goals: Vec<Goal>,
    pub archived: Vec<Goal>,
    pub reviews: Vec<GoalReview>,
    /// Next top-level id. Never reused, even after deletes.
    next_id: u64,
}

#[derive(Deserialize)]
struct GoalBookRecord {
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    archived: Vec<Goal>,
    #[serde(default)]
    reviews: Vec<GoalReview>,
    #[serde(default)]
    next_id: Option<u64>,
}

impl From<GoalBookRecord> for GoalBook {
    fn from(record: GoalBookRecord) -> Self {
        // Documents written before the counter existed, or edited by hand,
        // must not hand out an id that is already taken.
        let highest = record
            .goals
            .iter()
            .chain(&record.archived)
            .map(|g| g.id.root_index())
            .max()
            .unwrap_or(0);
        let next_id = record.next_id.unwrap_or(0).max(highest + 1);
        Self {
            goals: record.goals,
            archived: record.archived,
            reviews: record.reviews,
            next_id,
        }
    }
}

fn find<'a>(goals: &'a [Goal], id: &GoalId) -> Option<&'a Goal> {
    let mut prefixes = id.prefixes().into_iter();
    let first = prefixes.next()?;
    let mut current = goals.iter().find(|g| g.id == first)?;
    for prefix in prefixes {
        current = current.sub_goals.iter().find(|g| g.id == prefix)?;
    }
    Some(current)
}

fn find_mut<'a>(goals: &'a mut [Goal], id: &GoalId) -> Option<&'a mut Goal> {
    let mut prefixes = id.prefixes().into_iter();
    let first = prefixes.next()?;
    let mut current = goals.iter_mut().find(|g| g.id == first)?;
    for prefix in prefixes {
        current = current.sub_goals.iter_mut().find(|g| g.id == prefix)?;
    }
    Some(current)
}

/// Set progress; a completed goal dropping below 100% becomes active again.
fn apply_progress(goal: &mut Goal, progress: Progress, now: DateTime<Utc>) {
    goal.progress = progress;
    goal.last_updated = Some(now);
    if goal.status == GoalStatus::Completed && !progress.is_complete() {
        goal.status = GoalStatus::Active;
        goal.completed_at = None;
        tracing::info!(goal = %goal.id, "reopened goal");
    }
}

impl GoalBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.max(1)
    }

    /// Active (non-archived) goal by dotted id.
    pub fn get(&self, id: &GoalId) -> Result<&Goal> {
        find(&self.goals, id).ok_or_else(|| CoreError::not_found("goal", id.as_str()))
    }

    pub fn get_mut(&mut self, id: &GoalId) -> Result<&mut Goal> {
        find_mut(&mut self.goals, id).ok_or_else(|| CoreError::not_found("goal", id.as_str()))
    }

    pub fn get_archived(&self, id: &GoalId) -> Result<&Goal> {
        find(&self.archived, id).ok_or_else(|| CoreError::not_found("archived goal", id.as_str()))
    }

    pub fn add_goal(&mut self, draft: NewGoal, now: DateTime<Utc>) -> Result<GoalId> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name".to_string()).into());
        }
        let id = GoalId::root(self.next_id());
        self.next_id = self.next_id() + 1;

        let mut goal = Goal::new(id.clone(), name, now);
        goal.goal_type = draft.goal_type;
        goal.priority = draft.priority;
        goal.deadline = draft.deadline;
        if let Some(stages) = draft.stage_descriptions {
            goal.stage_descriptions = stages;
        }
        self.goals.push(goal);
        tracing::info!(goal = %id, "added goal");
        Ok(id)
    }

    /// Attach a child under `parent_id`. The child inherits the parent's
    /// type and priority and starts at 0%.
    pub fn add_sub_goal(
        &mut self,
        parent_id: &GoalId,
        name: &str,
        deadline: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<GoalId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name".to_string()).into());
        }
        if parent_id.depth() >= MAX_GOAL_DEPTH {
            return Err(CoreError::InvalidState(format!(
                "goal {parent_id} is already at the maximum depth of {MAX_GOAL_DEPTH}"
            )));
        }
        let parent = self.get_mut(parent_id)?;
        let index = parent
            .sub_goals
            .iter()
            .map(|g| g.id.last_index())
            .max()
            .unwrap_or(0)
            + 1;
        let id = parent_id.child(index);

        let mut child = Goal::new(id.clone(), name, now);
        child.goal_type = parent.goal_type;
        child.priority = parent.priority;
        child.deadline = deadline;
        parent.sub_goals.push(child);
        tracing::info!(goal = %id, "added sub-goal");
        Ok(id)
    }

    /// Set user progress. Out-of-range values are rejected before anything
    /// changes.
    pub fn update_progress(
        &mut self,
        id: &GoalId,
        value: u32,
        now: DateTime<Utc>,
    ) -> Result<ProgressUpdate> {
        let progress = Progress::new(value)?;
        let goal = self.get_mut(id)?;
        let before = goal.progress;
        apply_progress(goal, progress, now);

        let update = ProgressUpdate {
            id: id.clone(),
            before,
            after: progress,
            stage_before: before.stage(),
            stage_after: progress.stage(),
            can_complete: progress.is_complete() && goal.status == GoalStatus::Active,
        };
        if update.stage_changed() {
            tracing::info!(goal = %id, from = %update.stage_before, to = %update.stage_after, "goal changed stage");
        }
        Ok(update)
    }

    /// Mark a goal completed. Only allowed at 100%.
    pub fn complete(&mut self, id: &GoalId, now: DateTime<Utc>) -> Result<()> {
        let goal = self.get_mut(id)?;
        if goal.status == GoalStatus::Completed {
            return Err(CoreError::InvalidState(format!("goal {id} is already completed")));
        }
        if !goal.progress.is_complete() {
            return Err(CoreError::InvalidState(format!(
                "goal {id} is at {}; progress must reach 100% before completing",
                goal.progress
            )));
        }
        goal.status = GoalStatus::Completed;
        goal.completed_at = Some(now);
        goal.last_updated = Some(now);
        tracing::info!(goal = %id, "completed goal");
        Ok(())
    }

    pub fn set_status(&mut self, id: &GoalId, status: GoalStatus, now: DateTime<Utc>) -> Result<()> {
        match status {
            GoalStatus::Completed => self.complete(id, now),
            GoalStatus::Archived => self.archive(id, now),
            GoalStatus::Active => {
                let goal = self.get_mut(id)?;
                goal.status = GoalStatus::Active;
                goal.completed_at = None;
                goal.last_updated = Some(now);
                Ok(())
            }
        }
    }

    /// Archive a goal. Top-level goals move to the archive collection;
    /// sub-goals stay in place and are only marked archived.
    pub fn archive(&mut self, id: &GoalId, now: DateTime<Utc>) -> Result<()> {
        if !id.is_root() {
            let goal = self.get_mut(id)?;
            goal.status = GoalStatus::Archived;
            goal.archived_at = Some(now);
            return Ok(());
        }
        let index = self
            .goals
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| CoreError::not_found("goal", id.as_str()))?;
        let mut goal = self.goals.remove(index);
        goal.status = GoalStatus::Archived;
        goal.archived_at = Some(now);
        self.archived.push(goal);
        tracing::info!(goal = %id, "archived goal");
        Ok(())
    }

    /// Remove a goal and its subtree, active or archived.
    pub fn delete(&mut self, id: &GoalId) -> Result<Goal> {
        let removed = match id.parent() {
            None => {
                if let Some(index) = self.goals.iter().position(|g| &g.id == id) {
                    self.goals.remove(index)
                } else if let Some(index) = self.archived.iter().position(|g| &g.id == id) {
                    self.archived.remove(index)
                } else {
                    return Err(CoreError::not_found("goal", id.as_str()));
                }
            }
            Some(parent_id) => {
                let parent = self.get_mut(&parent_id)?;
                let index = parent
                    .sub_goals
                    .iter()
                    .position(|g| &g.id == id)
                    .ok_or_else(|| CoreError::not_found("goal", id.as_str()))?;
                parent.sub_goals.remove(index)
            }
        };
        tracing::info!(goal = %id, "deleted goal");
        Ok(removed)
    }

    /// Annotated views of all active goals.
    pub fn view(&self, now: DateTime<Utc>) -> Vec<GoalView> {
        self.goals.iter().map(|g| GoalView::of(g, now)).collect()
    }

    /// Store a review and apply each entry's `progress_after`. Every entry
    /// must name an active goal; otherwise nothing is applied.
    pub fn record_review(&mut self, review: GoalReview) -> Result<()> {
        for entry in &review.entries {
            self.get(&entry.goal_id)?;
        }
        for entry in &review.entries {
            let goal = self.get_mut(&entry.goal_id)?;
            if goal.progress != entry.progress_after {
                apply_progress(goal, entry.progress_after, review.date);
            }
        }
        tracing::info!(kind = %review.kind, entries = review.entries.len(), "recorded goal review");
        self.reviews.push(review);
        Ok(())
    }

    pub fn last_review(&self, kind: ReviewKind) -> Option<&GoalReview> {
        self.reviews
            .iter()
            .filter(|r| r.kind == kind)
            .max_by_key(|r| r.date)
    }

    /// Review kinds whose interval has elapsed since the last review of
    /// that kind. A kind never reviewed is due once there is an active goal.
    pub fn reviews_due(&self, now: DateTime<Utc>) -> Vec<ReviewKind> {
        ReviewKind::ALL
            .into_iter()
            .filter(|kind| match self.last_review(*kind) {
                Some(last) => now - last.date >= kind.interval(),
                None => !self.goals.is_empty(),
            })
            .collect()
    }
}
