//! Domain identifiers.
//!
//! Task ID はストアが採番する整数です。
//! - 挿入順に単調増加する（FIFO 順序の根拠になる）
//! - 永続化されるまでは存在しない（`NewTask` は ID を持たない）

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persisted task.
///
/// Assigned by the store on enqueue; strictly increasing in insertion order,
/// so ordering two `TaskId`s orders the tasks by enqueue time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<TaskId> for i64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_task_prefix() {
        assert_eq!(TaskId::new(42).to_string(), "task-42");
    }

    #[test]
    fn ids_order_by_insertion_value() {
        let mut ids = vec![TaskId::new(3), TaskId::new(1), TaskId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![TaskId::new(1), TaskId::new(2), TaskId::new(3)]);
    }

    #[test]
    fn serializes_as_plain_integer() {
        let s = serde_json::to_string(&TaskId::new(7)).unwrap();
        assert_eq!(s, "7");
        let back: TaskId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, TaskId::new(7));
    }
}
