//! State - タスクの状態
//!
//! # 状態遷移
//! - Pending -> Complete（実行成功）
//! - Pending -> Dead（リトライ上限に到達、上限を設定した場合のみ）
//!
//! 逆方向の遷移はなく、各タスクにつき一度だけ起こる。

use serde::{Deserialize, Serialize};

/// Processing state of a stored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be executed (or re-executed after a failure).
    Pending,

    /// Executed successfully.
    Complete,

    /// Gave up after exhausting the retry budget.
    Dead,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Dead)
    }

    /// Integer code used by the SQLite `status` column.
    pub fn code(self) -> i64 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Complete => 1,
            TaskStatus::Dead => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Pending),
            1 => Some(TaskStatus::Complete),
            2 => Some(TaskStatus::Dead),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskStatus::Pending, false)]
    #[case(TaskStatus::Complete, true)]
    #[case(TaskStatus::Dead, true)]
    fn terminal_states(#[case] status: TaskStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(TaskStatus::from_code(1), Some(TaskStatus::Complete));
        assert_eq!(TaskStatus::from_code(9), None);
    }

    #[test]
    fn serializes_lowercase() {
        let s = serde_json::to_string(&TaskStatus::Pending).unwrap();
        assert_eq!(s, "\"pending\"");
    }
}
