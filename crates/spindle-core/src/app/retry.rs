//! Retry policy: how many failed executions a task gets.

use serde::{Deserialize, Serialize};

/// Retry policy for tasks whose execution failed.
///
/// The worker is strictly serial, so there is no backoff: a failed task
/// stays Pending and, being the oldest, is picked up again next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Failed executions after which a task becomes Dead.
    /// `None` retries forever.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,
}

fn default_max_attempts() -> Option<u32> {
    Some(RetryPolicy::DEFAULT_MAX_ATTEMPTS)
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Never give up on a task.
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}
