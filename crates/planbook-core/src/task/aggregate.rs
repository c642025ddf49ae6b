//! Recursive completion counting over a task forest.

use serde::{Deserialize, Serialize};

use super::{status_of, CompletionMap, TaskNode, TaskPath, TaskStatus};

/// Per-day completion counts. `total` is always the sum of the other three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCounts {
    pub completed: u32,
    pub quit: u32,
    pub pending: u32,
    pub total: u32,
}

impl CompletionCounts {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Done => self.completed += 1,
            TaskStatus::Quit => self.quit += 1,
            TaskStatus::Pending => self.pending += 1,
        }
        self.total += 1;
    }

    /// Integer percentage of completed tasks; 0 for an empty day.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// Count every node in the forest by its status.
pub fn aggregate(forest: &[TaskNode], completion: &CompletionMap) -> CompletionCounts {
    let mut counts = CompletionCounts::default();
    super::walk(forest, |path, _| counts.record(status_of(completion, path)));
    counts
}

/// Whether any node, at any depth, is done.
pub fn has_done(forest: &[TaskNode], completion: &CompletionMap) -> bool {
    fn go(nodes: &[TaskNode], prefix: Option<&TaskPath>, completion: &CompletionMap) -> bool {
        nodes.iter().enumerate().any(|(i, node)| {
            let path = match prefix {
                Some(parent) => parent.child(i),
                None => TaskPath::root(i),
            };
            status_of(completion, &path).is_done() || go(&node.children, Some(&path), completion)
        })
    }
    go(forest, None, completion)
}
