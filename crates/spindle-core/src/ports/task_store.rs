//! TaskStore port - タスクの正本（source of truth）
//!
//! 未処理の仕事はすべてここにあり、プロセスのメモリには残さない。
//! そのためワーカーがクラッシュしても、次の起動で Pending から再開できる。
//!
//! # 実装
//! - `InMemoryTaskStore`: 開発・テスト用
//! - `SqliteTaskStore`: 永続化（sqlx + SQLite）

use async_trait::async_trait;

use crate::domain::{NewTask, StoreError, TaskId, TaskRecord, TaskStatus};
use crate::observability::QueueCounts;
use crate::typed::{PayloadCodec, Task};

/// Durable collection of tasks keyed by status.
///
/// # Invariants
/// - `fetch_pending` never returns a Complete or Dead task.
/// - `is_empty` is true iff no task is Pending.
/// - ids are assigned in strictly increasing insertion order.
///
/// Single consumer: `fetch_pending` does not claim the task. A second worker
/// would need an atomic Pending -> Claimed transition here.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new Pending task and return its assigned id.
    async fn enqueue(&self, task: NewTask) -> Result<TaskId, StoreError>;

    /// Persist several tasks; ids are returned in input order.
    ///
    /// Implementations backed by a transactional medium write all or nothing.
    async fn enqueue_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<TaskId>, StoreError> {
        let mut ids = Vec::with_capacity(tasks.len());
        for task in tasks {
            ids.push(self.enqueue(task).await?);
        }
        Ok(ids)
    }

    /// Oldest Pending task (lowest id), without changing its status.
    async fn fetch_pending(&self) -> Result<Option<TaskRecord>, StoreError>;

    /// Pending -> Complete. Completing a finished task is a no-op.
    async fn mark_complete(&self, id: TaskId) -> Result<(), StoreError>;

    /// Count one failed execution of a Pending task.
    ///
    /// When `max_attempts` is set and reached the task becomes Dead.
    /// Returns the status after the update.
    async fn record_failure(
        &self,
        id: TaskId,
        error: &str,
        max_attempts: Option<u32>,
    ) -> Result<TaskStatus, StoreError>;

    /// True iff no task is Pending.
    async fn is_empty(&self) -> Result<bool, StoreError>;

    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError>;

    /// Every stored task, ascending by id.
    async fn list(&self) -> Result<Vec<TaskRecord>, StoreError>;

    async fn counts(&self) -> Result<QueueCounts, StoreError>;
}

/// Typed conveniences on top of [`TaskStore`].
#[async_trait]
pub trait TaskStoreExt: TaskStore {
    /// Serialize `task` and enqueue it.
    ///
    /// Serialization happens before the store is touched, so a payload that
    /// cannot be serialized never produces a row.
    async fn enqueue_task<T: Task>(&self, task: &T) -> Result<TaskId, StoreError> {
        let new_task = PayloadCodec::encode(task)?;
        self.enqueue(new_task).await
    }
}

impl<S: TaskStore + ?Sized> TaskStoreExt for S {}
