use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TaskId, TaskStatus};

/// Discriminator selecting which handler executes a task.
///
/// Naming convention: `{namespace}.{domain}.{action}.v{major}`,
/// e.g. `crawl.listing.v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKind(String);

impl TaskKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A task that has not been persisted yet (kind + payload, no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    kind: TaskKind,
    payload: serde_json::Value,
}

impl NewTask {
    pub fn new(kind: TaskKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// A task as stored: identity, kind, payload and processing state.
///
/// This is everything needed to re-execute the task after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub kind: TaskKind,
    pub payload: serde_json::Value,
    pub status: TaskStatus,

    /// Number of failed executions recorded so far.
    pub attempts: u32,

    /// Message of the most recent failed execution.
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Set when the task reaches Complete or Dead.
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Build a fresh Pending record for `task` under `id`.
    pub fn pending(id: TaskId, task: NewTask) -> Self {
        Self {
            id,
            kind: task.kind,
            payload: task.payload,
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Pending -> Complete. Returns false if the task was already terminal.
    pub fn mark_complete(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Complete;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Count a failed execution; moves to Dead once `max_attempts` is reached.
    ///
    /// Terminal records are left untouched.
    pub fn record_failure(&mut self, error: String, max_attempts: Option<u32>) -> TaskStatus {
        if self.status != TaskStatus::Pending {
            return self.status;
        }
        self.attempts += 1;
        self.last_error = Some(error);
        if max_attempts.is_some_and(|max| self.attempts >= max) {
            self.status = TaskStatus::Dead;
            self.finished_at = Some(Utc::now());
        }
        self.status
    }
}
