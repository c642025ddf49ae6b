//! Task tree model.
//!
//! A day's tasks form an ordered forest. Every node is addressed by its
//! position ([`TaskPath`], rendered as `"0_1_2"`), and that rendering is the
//! key under which the node's [`TaskStatus`] is stored in the completion
//! map. Sibling names may repeat; positions never collide.

pub mod aggregate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result, ValidationError};

pub use aggregate::{aggregate, has_done, CompletionCounts};

/// Completion map keyed by rendered [`TaskPath`]. Absent key means pending.
pub type CompletionMap = BTreeMap<String, TaskStatus>;

/// Tri-state resolution of a task.
///
/// Older documents stored a boolean (`true` = done). Decoding maps that
/// encoding, and any unknown label, onto the three variants once so the
/// algorithms never see it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "RawStatus")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Quit,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Flag(bool),
    Label(String),
    Missing(()),
}

impl From<RawStatus> for TaskStatus {
    fn from(raw: RawStatus) -> Self {
        match raw {
            RawStatus::Flag(true) => TaskStatus::Done,
            RawStatus::Flag(false) | RawStatus::Missing(()) => TaskStatus::Pending,
            RawStatus::Label(label) => label.parse().unwrap_or_default(),
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Quit => "quit",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Checkbox toggle: done goes back to pending, anything else becomes done.
    pub fn toggled(&self) -> TaskStatus {
        match self {
            TaskStatus::Done => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::Quit => TaskStatus::Done,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "" => Ok(TaskStatus::Pending),
            "done" | "completed" | "true" => Ok(TaskStatus::Done),
            "quit" => Ok(TaskStatus::Quit),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("expected pending, done or quit, got '{other}'"),
            }),
        }
    }
}

/// A task with its ordered sub-tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    #[serde(alias = "task_name", default = "unnamed_task")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "sub_jobs", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskNode>,
    /// Date of the plan this task was copied from, if it was carried over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carried_over_from: Option<NaiveDate>,
}

fn unnamed_task() -> String {
    "Unknown".to_string()
}

impl TaskNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            children: Vec::new(),
            carried_over_from: None,
        }
    }

    pub fn with_children(mut self, children: Vec<TaskNode>) -> Self {
        self.children = children;
        self
    }
}

/// Position of a node in the forest: top-level index followed by child
/// indices. Rendered as indices joined by `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskPath(Vec<usize>);

impl TaskPath {
    pub fn root(index: usize) -> Self {
        TaskPath(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        TaskPath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of segments; top-level tasks have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn top(&self) -> usize {
        self.0[0]
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for TaskPath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indices = s
            .split('_')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ValidationError::InvalidTaskPath(s.to_string()))?;
        if indices.is_empty() {
            return Err(ValidationError::InvalidTaskPath(s.to_string()));
        }
        Ok(TaskPath(indices))
    }
}

impl Serialize for TaskPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One node of a flattened forest, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatTask {
    pub path: TaskPath,
    pub depth: usize,
    pub name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carried_over_from: Option<NaiveDate>,
}

/// Status of the node at `path`; absent keys are pending.
pub fn status_of(completion: &CompletionMap, path: &TaskPath) -> TaskStatus {
    completion
        .get(&path.to_string())
        .copied()
        .unwrap_or_default()
}

pub fn resolve<'a>(forest: &'a [TaskNode], path: &TaskPath) -> Result<&'a TaskNode> {
    let (first, rest) = path
        .indices()
        .split_first()
        .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    let mut node = forest
        .get(*first)
        .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    for index in rest {
        node = node
            .children
            .get(*index)
            .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    }
    Ok(node)
}

pub fn resolve_mut<'a>(forest: &'a mut [TaskNode], path: &TaskPath) -> Result<&'a mut TaskNode> {
    let (first, rest) = path
        .indices()
        .split_first()
        .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    let mut node = forest
        .get_mut(*first)
        .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    for index in rest {
        node = node
            .children
            .get_mut(*index)
            .ok_or_else(|| CoreError::not_found("task", path.to_string()))?;
    }
    Ok(node)
}

/// Visit every node in pre-order together with its path.
pub fn walk<F>(forest: &[TaskNode], mut visit: F)
where
    F: FnMut(&TaskPath, &TaskNode),
{
    fn go<F: FnMut(&TaskPath, &TaskNode)>(nodes: &[TaskNode], prefix: Option<&TaskPath>, visit: &mut F) {
        for (i, node) in nodes.iter().enumerate() {
            let path = match prefix {
                Some(parent) => parent.child(i),
                None => TaskPath::root(i),
            };
            visit(&path, node);
            go(&node.children, Some(&path), visit);
        }
    }
    go(forest, None, &mut visit);
}

pub fn count_nodes(forest: &[TaskNode]) -> usize {
    forest.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

/// First node in pre-order whose name matches exactly.
pub fn find_by_name(forest: &[TaskNode], name: &str) -> Option<TaskPath> {
    let mut found = None;
    walk(forest, |path, node| {
        if found.is_none() && node.name == name {
            found = Some(path.clone());
        }
    });
    found
}

pub fn flatten(forest: &[TaskNode], completion: &CompletionMap) -> Vec<FlatTask> {
    let mut out = Vec::with_capacity(count_nodes(forest));
    walk(forest, |path, node| {
        out.push(FlatTask {
            path: path.clone(),
            depth: path.depth(),
            name: node.name.clone(),
            status: status_of(completion, path),
            carried_over_from: node.carried_over_from,
        });
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TaskNode> {
        vec![
            TaskNode::new("Write"),
            TaskNode::new("Read").with_children(vec![
                TaskNode::new("Chapter 1"),
                TaskNode::new("Chapter 2").with_children(vec![TaskNode::new("Notes")]),
            ]),
        ]
    }

    #[test]
    fn status_decodes_legacy_booleans() {
        let map: CompletionMap =
            serde_json::from_str(r#"{"0": true, "1": false, "2": "quit", "3": "done", "4": null}"#)
                .unwrap();
        assert_eq!(map["0"], TaskStatus::Done);
        assert_eq!(map["1"], TaskStatus::Pending);
        assert_eq!(map["2"], TaskStatus::Quit);
        assert_eq!(map["3"], TaskStatus::Done);
        assert_eq!(map["4"], TaskStatus::Pending);
    }

    #[test]
    fn unknown_status_label_is_pending() {
        let status: TaskStatus = serde_json::from_str(r#""skipped""#).unwrap();
        assert_eq!(status, TaskStatus::Pending);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Quit).unwrap(), r#""quit""#);
    }

    #[test]
    fn toggle_cycles_through_done() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Done);
        assert_eq!(TaskStatus::Done.toggled(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Quit.toggled(), TaskStatus::Done);
    }

    #[test]
    fn path_round_trips_through_text() {
        let path: TaskPath = "0_1_2".parse().unwrap();
        assert_eq!(path.indices(), &[0, 1, 2]);
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "0_1_2");
    }

    #[test]
    fn path_rejects_garbage() {
        assert!("".parse::<TaskPath>().is_err());
        assert!("0__1".parse::<TaskPath>().is_err());
        assert!("Write".parse::<TaskPath>().is_err());
        assert!("-1".parse::<TaskPath>().is_err());
    }

    #[test]
    fn resolve_walks_positions() {
        let forest = sample();
        let node = resolve(&forest, &"1_1_0".parse().unwrap()).unwrap();
        assert_eq!(node.name, "Notes");
        let err = resolve(&forest, &"1_5".parse().unwrap()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn walk_is_pre_order() {
        let forest = sample();
        let mut seen = Vec::new();
        walk(&forest, |path, node| seen.push(format!("{path}:{}", node.name)));
        assert_eq!(
            seen,
            vec!["0:Write", "1:Read", "1_0:Chapter 1", "1_1:Chapter 2", "1_1_0:Notes"]
        );
    }

    #[test]
    fn find_by_name_returns_first_match() {
        let mut forest = sample();
        forest.push(TaskNode::new("Notes"));
        assert_eq!(find_by_name(&forest, "Notes").unwrap().to_string(), "1_1_0");
        assert!(find_by_name(&forest, "Missing").is_none());
    }

    #[test]
    fn task_node_accepts_legacy_field_names() {
        let node: TaskNode = serde_json::from_str(
            r#"{"task_name": "Run", "sub_jobs": [{"name": "Stretch"}]}"#,
        )
        .unwrap();
        assert_eq!(node.name, "Run");
        assert_eq!(node.children[0].name, "Stretch");
    }

    #[test]
    fn flatten_reports_depth_and_status() {
        let forest = sample();
        let mut completion = CompletionMap::new();
        completion.insert("1_1".to_string(), TaskStatus::Quit);
        let flat = flatten(&forest, &completion);
        assert_eq!(flat.len(), 5);
        assert_eq!(flat[3].depth, 2);
        assert_eq!(flat[3].status, TaskStatus::Quit);
        assert_eq!(flat[0].status, TaskStatus::Pending);
    }
}
