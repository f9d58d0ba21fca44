use serde::{Deserialize, Serialize};

use crate::domain::TaskStatus;

/// Number of stored tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub complete: usize,
    pub dead: usize,
}

impl QueueCounts {
    pub fn add(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Complete => self.complete += 1,
            TaskStatus::Dead => self.dead += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.complete + self.dead
    }
}
