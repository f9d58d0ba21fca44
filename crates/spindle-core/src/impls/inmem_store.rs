//! InMemoryTaskStore - 開発・テスト用の正本
//!
//! プロセスが落ちると中身も消えるので、クラッシュ耐性が要る場面では
//! `SqliteTaskStore` を使う。

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NewTask, StoreError, TaskId, TaskRecord, TaskStatus};
use crate::observability::QueueCounts;
use crate::ports::TaskStore;

struct InMemoryState {
    /// All task records, ordered by id (= insertion order).
    records: BTreeMap<TaskId, TaskRecord>,

    /// Next task ID to assign.
    next_id: i64,
}

impl InMemoryState {
    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, task: NewTask) -> TaskId {
        let id = self.allocate_id();
        self.records.insert(id, TaskRecord::pending(id, task));
        id
    }
}

/// Task store kept in process memory.
pub struct InMemoryTaskStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn enqueue(&self, task: NewTask) -> Result<TaskId, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.insert(task))
    }

    async fn enqueue_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<TaskId>, StoreError> {
        // one lock for the whole batch so ids stay contiguous
        let mut state = self.state.lock().await;
        Ok(tasks.into_iter().map(|task| state.insert(task)).collect())
    }

    async fn fetch_pending(&self) -> Result<Option<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .values()
            .find(|r| r.status == TaskStatus::Pending)
            .cloned())
    }

    async fn mark_complete(&self, id: TaskId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.mark_complete();
        Ok(())
    }

    async fn record_failure(
        &self,
        id: TaskId,
        error: &str,
        max_attempts: Option<u32>,
    ) -> Result<TaskStatus, StoreError> {
        let mut state = self.state.lock().await;
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        Ok(record.record_failure(error.to_string(), max_attempts))
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(!state
            .records
            .values()
            .any(|r| r.status == TaskStatus::Pending))
    }

    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records.values().cloned().collect())
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let state = self.state.lock().await;
        let mut counts = QueueCounts::default();
        for record in state.records.values() {
            counts.add(record.status);
        }
        Ok(counts)
    }
}
