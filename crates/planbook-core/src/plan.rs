//! Day plans: one task forest plus its completion map per calendar date.
//!
//! Decoding goes through [`DayPlanRecord`], which accepts the field names
//! used by older documents and re-keys name-based completion entries to
//! positional paths. After that the plan only ever sees path keys; entries
//! that match no task are parked in `stale_completion` and never looked at
//! again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result, ValidationError};
use crate::task::{
    self, aggregate, has_done, CompletionCounts, CompletionMap, FlatTask, TaskNode, TaskPath,
    TaskStatus,
};

/// The plan for a single date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub tasks: Vec<TaskNode>,
    pub completion: CompletionMap,
    /// Legacy completion entries that matched no task when first decoded.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stale_completion: BTreeMap<String, TaskStatus>,
    pub last_modified: DateTime<Utc>,
    /// Free-text plan body produced by the planning workflow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Which of the previous day's unfinished top-level tasks to carry over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarryOver {
    All,
    /// Top-level indices in the previous plan.
    Indices(Vec<usize>),
}

/// On-disk shape of a day plan, including legacy field names.
#[derive(Debug, Deserialize)]
pub struct DayPlanRecord {
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default, alias = "jobs")]
    tasks: Vec<TaskNode>,
    #[serde(default, alias = "completion_status")]
    completion: BTreeMap<String, TaskStatus>,
    #[serde(default)]
    stale_completion: BTreeMap<String, TaskStatus>,
    #[serde(
        default,
        alias = "last_checked",
        deserialize_with = "crate::timestamp::deserialize_option"
    )]
    last_modified: Option<DateTime<Utc>>,
    #[serde(default, alias = "plan_content")]
    content: Option<String>,
}

impl DayPlanRecord {
    /// Build the plan stored under `date`. The storage key wins over any
    /// date recorded inside the document.
    pub fn into_plan(self, date: NaiveDate) -> DayPlan {
        if let Some(recorded) = self.date {
            if recorded != date {
                tracing::warn!(%recorded, %date, "day plan records a different date than its key");
            }
        }
        let mut stale_completion = self.stale_completion;
        let completion = rekey_completion(&self.tasks, self.completion, &mut stale_completion);
        let last_modified = self
            .last_modified
            .or_else(|| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
            .unwrap_or_else(Utc::now);
        DayPlan {
            date,
            tasks: self.tasks,
            completion,
            stale_completion,
            last_modified,
            content: self.content,
        }
    }
}

/// Map every completion key onto a positional path. Keys that already
/// resolve as paths are kept; name keys are moved to the first node with
/// that name unless a path key already covers it; the rest move to `stale`.
fn rekey_completion(
    tasks: &[TaskNode],
    raw: BTreeMap<String, TaskStatus>,
    stale: &mut BTreeMap<String, TaskStatus>,
) -> CompletionMap {
    let mut completion = CompletionMap::new();
    let mut by_name = Vec::new();

    for (key, status) in raw {
        match key.parse::<TaskPath>() {
            Ok(path) if task::resolve(tasks, &path).is_ok() => {
                completion.insert(path.to_string(), status);
            }
            _ => by_name.push((key, status)),
        }
    }

    for (key, status) in by_name {
        match task::find_by_name(tasks, &key) {
            Some(path) => {
                completion.entry(path.to_string()).or_insert(status);
            }
            None => {
                tracing::warn!(key = %key, "keeping stale completion key");
                stale.insert(key, status);
            }
        }
    }
    completion
}

impl DayPlan {
    /// A fresh plan with one top-level task per name.
    pub fn new<I, S>(date: NaiveDate, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            date,
            tasks: names.into_iter().map(TaskNode::new).collect(),
            completion: CompletionMap::new(),
            stale_completion: BTreeMap::new(),
            last_modified: Utc::now(),
            content: None,
        }
    }

    pub fn from_json(date: NaiveDate, raw: &str) -> Result<Self> {
        let record: DayPlanRecord = serde_json::from_str(raw).map_err(|source| CoreError::Parse {
            what: format!("day plan {date}"),
            source,
        })?;
        Ok(record.into_plan(date))
    }

    pub fn counts(&self) -> CompletionCounts {
        aggregate(&self.tasks, &self.completion)
    }

    /// A plan qualifies for the streak when any task at any depth is done.
    pub fn qualifies(&self) -> bool {
        has_done(&self.tasks, &self.completion)
    }

    pub fn status(&self, path: &TaskPath) -> Result<TaskStatus> {
        task::resolve(&self.tasks, path)?;
        Ok(task::status_of(&self.completion, path))
    }

    pub fn entries(&self) -> Vec<FlatTask> {
        task::flatten(&self.tasks, &self.completion)
    }

    pub fn set_status(&mut self, path: &TaskPath, status: TaskStatus) -> Result<()> {
        task::resolve(&self.tasks, path)?;
        self.completion.insert(path.to_string(), status);
        self.touch();
        Ok(())
    }

    /// Flip the checkbox at `path` and return the new status.
    pub fn toggle(&mut self, path: &TaskPath) -> Result<TaskStatus> {
        let next = self.status(path)?.toggled();
        self.completion.insert(path.to_string(), next);
        self.touch();
        Ok(next)
    }

    pub fn add_task(&mut self, name: &str) -> Result<TaskPath> {
        let name = required_name(name)?;
        self.tasks.push(TaskNode::new(name));
        self.touch();
        Ok(TaskPath::root(self.tasks.len() - 1))
    }

    /// Append children under `path`; returns their new paths.
    pub fn add_subtasks(&mut self, path: &TaskPath, names: &[String]) -> Result<Vec<TaskPath>> {
        if names.is_empty() {
            return Err(ValidationError::Empty("subtasks".to_string()).into());
        }
        let names = names
            .iter()
            .map(|n| required_name(n))
            .collect::<Result<Vec<_>>>()?;

        let parent = task::resolve_mut(&mut self.tasks, path)?;
        let start = parent.children.len();
        parent.children.extend(names.into_iter().map(TaskNode::new));
        let end = parent.children.len();

        self.touch();
        Ok((start..end).map(|i| path.child(i)).collect())
    }

    /// Remove a top-level task and shift the completion keys of the tasks
    /// after it so every status stays attached to the same node.
    pub fn remove_task(&mut self, index: usize) -> Result<TaskNode> {
        if index >= self.tasks.len() {
            return Err(CoreError::not_found("task", index.to_string()));
        }
        let removed = self.tasks.remove(index);

        let previous = std::mem::take(&mut self.completion);
        for (key, status) in previous {
            let Ok(path) = key.parse::<TaskPath>() else {
                self.stale_completion.insert(key, status);
                continue;
            };
            let top = path.top();
            if top == index {
                continue;
            }
            if top < index {
                self.completion.insert(key, status);
            } else {
                let mut indices = path.indices().to_vec();
                indices[0] = top - 1;
                let shifted = indices
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join("_");
                self.completion.insert(shifted, status);
            }
        }

        self.touch();
        Ok(removed)
    }

    /// Top-level tasks that are still pending, with their indices.
    pub fn unfinished(&self) -> Vec<(usize, &TaskNode)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(i, _)| task::status_of(&self.completion, &TaskPath::root(*i)) == TaskStatus::Pending)
            .collect()
    }

    /// Copy unfinished top-level tasks of `previous` to the end of this plan,
    /// stamped with the date they came from. Sub-tasks come along with a
    /// fresh (pending) status. A task already carried over from the same
    /// date under the same name is skipped. Returns the new paths.
    pub fn carry_over_from(&mut self, previous: &DayPlan, selection: CarryOver) -> Result<Vec<TaskPath>> {
        if previous.date >= self.date {
            return Err(CoreError::InvalidState(format!(
                "cannot carry tasks from {} into {}",
                previous.date, self.date
            )));
        }
        let unfinished = previous.unfinished();
        let picked: Vec<&TaskNode> = match selection {
            CarryOver::All => unfinished.iter().map(|(_, node)| *node).collect(),
            CarryOver::Indices(indices) => indices
                .iter()
                .map(|index| {
                    if *index >= previous.tasks.len() {
                        return Err(CoreError::not_found("task", index.to_string()));
                    }
                    unfinished
                        .iter()
                        .find(|(i, _)| i == index)
                        .map(|(_, node)| *node)
                        .ok_or_else(|| {
                            CoreError::InvalidState(format!(
                                "task {index} of {} is already resolved",
                                previous.date
                            ))
                        })
                })
                .collect::<Result<_>>()?,
        };

        let mut added = Vec::new();
        for node in picked {
            let already = self
                .tasks
                .iter()
                .any(|t| t.carried_over_from == Some(previous.date) && t.name == node.name);
            if already {
                continue;
            }
            let mut copy = node.clone();
            copy.carried_over_from = Some(previous.date);
            self.tasks.push(copy);
            added.push(TaskPath::root(self.tasks.len() - 1));
        }
        if !added.is_empty() {
            tracing::debug!(from = %previous.date, to = %self.date, count = added.len(), "carried over tasks");
            self.touch();
        }
        Ok(added)
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("task name".to_string()).into());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample() -> DayPlan {
        let mut plan = DayPlan::new(date(), ["Exercise", "Study", "Cook"]);
        plan.add_subtasks(&TaskPath::root(1), &["Math".into(), "History".into()])
            .unwrap();
        plan
    }

    #[test]
    fn legacy_document_decodes_to_positional_keys() {
        let raw = r#"{
            "jobs": [
                {"name": "Exercise"},
                {"name": "Study", "sub_jobs": [{"name": "Math"}, {"name": "History"}]}
            ],
            "completion_status": {"Exercise": true, "Math": "quit", "Gone": true},
            "last_checked": "2024-03-01T21:10:00.5",
            "plan_content": "- [ ] Exercise"
        }"#;
        let plan = DayPlan::from_json(date(), raw).unwrap();
        assert_eq!(plan.completion["0"], TaskStatus::Done);
        assert_eq!(plan.completion["1_0"], TaskStatus::Quit);
        assert_eq!(plan.stale_completion["Gone"], TaskStatus::Done);
        assert!(!plan.completion.contains_key("Gone"));
        assert_eq!(plan.content.as_deref(), Some("- [ ] Exercise"));

        let counts = plan.counts();
        assert_eq!((counts.completed, counts.quit, counts.pending), (1, 1, 2));
    }

    #[test]
    fn path_key_wins_over_name_key() {
        let raw = r#"{
            "tasks": [{"name": "A"}],
            "completion": {"0": "quit", "A": "done"}
        }"#;
        let plan = DayPlan::from_json(date(), raw).unwrap();
        assert_eq!(plan.completion["0"], TaskStatus::Quit);
        assert!(!plan.completion.contains_key("A"));
    }

    #[test]
    fn duplicate_sibling_names_keep_separate_status() {
        let mut plan = DayPlan::new(date(), ["Walk", "Walk"]);
        plan.set_status(&TaskPath::root(1), TaskStatus::Done).unwrap();
        assert_eq!(plan.status(&TaskPath::root(0)).unwrap(), TaskStatus::Pending);
        assert_eq!(plan.status(&TaskPath::root(1)).unwrap(), TaskStatus::Done);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = DayPlan::from_json(date(), "{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn serialized_plan_reloads_identically() {
        let mut plan = sample();
        plan.set_status(&"1_1".parse().unwrap(), TaskStatus::Quit).unwrap();
        plan.content = Some("notes".into());
        let json = serde_json::to_string(&plan).unwrap();
        let reloaded = DayPlan::from_json(date(), &json).unwrap();
        assert_eq!(reloaded, plan);
    }

    #[test]
    fn set_status_rejects_unknown_path() {
        let mut plan = sample();
        let before = plan.clone();
        let err = plan.set_status(&"1_9".parse().unwrap(), TaskStatus::Done).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(plan, before);
    }

    #[test]
    fn toggle_marks_and_unmarks() {
        let mut plan = sample();
        let path = "1_0".parse().unwrap();
        assert_eq!(plan.toggle(&path).unwrap(), TaskStatus::Done);
        assert!(plan.qualifies());
        assert_eq!(plan.toggle(&path).unwrap(), TaskStatus::Pending);
        assert!(!plan.qualifies());
    }

    #[test]
    fn add_subtasks_returns_new_paths() {
        let mut plan = sample();
        let paths = plan
            .add_subtasks(&"1_0".parse().unwrap(), &["Algebra".into(), "Geometry".into()])
            .unwrap();
        let rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["1_0_0", "1_0_1"]);
        assert_eq!(plan.counts().total, 7);
    }

    #[test]
    fn add_subtasks_rejects_blank_names_without_mutating() {
        let mut plan = sample();
        let before = plan.tasks.clone();
        assert!(plan
            .add_subtasks(&TaskPath::root(0), &["ok".into(), "  ".into()])
            .is_err());
        assert!(plan.add_subtasks(&TaskPath::root(0), &[]).is_err());
        assert_eq!(plan.tasks, before);
    }

    #[test]
    fn remove_task_shifts_later_keys() {
        let mut plan = sample();
        plan.set_status(&TaskPath::root(0), TaskStatus::Done).unwrap();
        plan.set_status(&"1_1".parse().unwrap(), TaskStatus::Quit).unwrap();
        plan.set_status(&TaskPath::root(2), TaskStatus::Done).unwrap();

        let removed = plan.remove_task(0).unwrap();
        assert_eq!(removed.name, "Exercise");
        assert_eq!(plan.completion.get("0_1"), Some(&TaskStatus::Quit));
        assert_eq!(plan.completion.get("1"), Some(&TaskStatus::Done));
        assert!(!plan.completion.contains_key("2"));
        assert_eq!(plan.status(&"0_1".parse().unwrap()).unwrap(), TaskStatus::Quit);
    }

    #[test]
    fn remove_task_out_of_range_is_not_found() {
        let mut plan = sample();
        assert!(plan.remove_task(3).unwrap_err().is_not_found());
    }

    #[test]
    fn stale_name_key_never_attaches_to_a_later_task() {
        let raw = r#"{"tasks": [{"name": "A"}], "completion": {"Gone": true}}"#;
        let mut plan = DayPlan::from_json(date(), raw).unwrap();
        let path = plan.add_task("Gone").unwrap();
        assert_eq!(plan.status(&path).unwrap(), TaskStatus::Pending);

        let json = serde_json::to_string(&plan).unwrap();
        let reloaded = DayPlan::from_json(date(), &json).unwrap();
        assert_eq!(reloaded.status(&path).unwrap(), TaskStatus::Pending);
        assert_eq!(reloaded.stale_completion["Gone"], TaskStatus::Done);
        assert!(!reloaded.qualifies());
    }

    fn yesterday() -> DayPlan {
        let mut plan = DayPlan::new(date(), ["Exercise", "Study", "Cook", "Call"]);
        plan.add_subtasks(&TaskPath::root(1), &["Math".into()]).unwrap();
        plan.set_status(&TaskPath::root(0), TaskStatus::Done).unwrap();
        plan.set_status(&TaskPath::root(2), TaskStatus::Quit).unwrap();
        plan.set_status(&"1_0".parse().unwrap(), TaskStatus::Done).unwrap();
        plan
    }

    fn today() -> DayPlan {
        DayPlan::new(date().succ_opt().unwrap(), ["Write"])
    }

    #[test]
    fn unfinished_lists_pending_top_level_tasks() {
        let previous = yesterday();
        let names: Vec<(usize, &str)> = previous
            .unfinished()
            .into_iter()
            .map(|(i, node)| (i, node.name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "Study"), (3, "Call")]);
    }

    #[test]
    fn carry_over_copies_unfinished_tasks_with_fresh_status() {
        let previous = yesterday();
        let mut plan = today();
        let added = plan.carry_over_from(&previous, CarryOver::All).unwrap();
        let rendered: Vec<String> = added.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["1", "2"]);

        let study = &plan.tasks[1];
        assert_eq!(study.name, "Study");
        assert_eq!(study.carried_over_from, Some(previous.date));
        assert_eq!(study.children[0].name, "Math");
        assert_eq!(plan.status(&"1_0".parse().unwrap()).unwrap(), TaskStatus::Pending);
        assert_eq!(plan.counts().total, 4);

        // A second pass does not duplicate.
        assert!(plan.carry_over_from(&previous, CarryOver::All).unwrap().is_empty());
        assert_eq!(plan.tasks.len(), 3);
    }

    #[test]
    fn carry_over_selection_is_validated_before_copying() {
        let previous = yesterday();
        let mut plan = today();
        let before = plan.clone();

        let err = plan
            .carry_over_from(&previous, CarryOver::Indices(vec![3, 0]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert!(plan
            .carry_over_from(&previous, CarryOver::Indices(vec![9]))
            .unwrap_err()
            .is_not_found());
        assert_eq!(plan, before);

        let added = plan
            .carry_over_from(&previous, CarryOver::Indices(vec![3]))
            .unwrap();
        assert_eq!(added, vec![TaskPath::root(1)]);
        assert_eq!(plan.tasks[1].name, "Call");
    }

    #[test]
    fn carry_over_requires_an_earlier_plan() {
        let mut plan = today();
        let same_day = DayPlan::new(plan.date, ["x"]);
        assert!(matches!(
            plan.carry_over_from(&same_day, CarryOver::All),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn carried_over_date_round_trips() {
        let mut plan = today();
        plan.carry_over_from(&yesterday(), CarryOver::All).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"carried_over_from\":\"2024-03-01\""));
        assert_eq!(DayPlan::from_json(plan.date, &json).unwrap(), plan);
    }
}
