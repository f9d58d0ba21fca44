//! WorkerLoop - タスク実行ループ
//!
//! # フロー
//! 1. TaskStore::is_empty() が true なら Idle（終了）
//! 2. TaskStore::fetch_pending() で最古の Pending を取得（None なら Idle）
//! 3. TypedRegistry で kind に応じた Handler を実行
//! 4. 成功: mark_complete / タスクの失敗: record_failure（Pending のまま）
//! 5. ストアの失敗: 呼び出し元へ WorkerError を返す
//!
//! ループは直列で、同時に実行するタスクは常に一つ。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::retry::RetryPolicy;
use crate::domain::{TaskError, TaskId, TaskStatus, WorkerError};
use crate::ports::TaskStore;
use crate::typed::{ExecContext, TypedRegistry};

/// Worker settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Stop after this many executions in one invocation.
    #[serde(default)]
    pub max_tasks: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Idle,
}

/// Result of one Running iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing Pending; the worker goes Idle.
    Idle,

    Completed(TaskId),

    /// Execution failed; `status` is Pending (will be retried) or Dead.
    Failed { id: TaskId, status: TaskStatus },
}

/// Summary of one `run` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub completed: usize,
    pub failed: usize,
    pub dead: usize,
}

impl WorkerReport {
    pub fn executions(&self) -> usize {
        self.completed + self.failed
    }
}

/// The single consumer of a [`TaskStore`].
pub struct WorkerLoop {
    store: Arc<dyn TaskStore>,
    registry: Arc<TypedRegistry>,
    config: WorkerConfig,
}

impl WorkerLoop {
    pub fn new(store: Arc<dyn TaskStore>, registry: Arc<TypedRegistry>, config: WorkerConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Drain the store. Returns when nothing is Pending (or `max_tasks` is
    /// reached); a store failure ends the invocation with an error.
    pub async fn run(&self) -> Result<WorkerReport, WorkerError> {
        tracing::info!(max_tasks = ?self.config.max_tasks, "worker started");
        let mut report = WorkerReport::default();
        let mut state = WorkerState::Running;

        while state == WorkerState::Running {
            if self
                .config
                .max_tasks
                .is_some_and(|max| report.executions() >= max)
            {
                tracing::info!("task limit reached");
                break;
            }

            match self.step().await? {
                Step::Idle => state = WorkerState::Idle,
                Step::Completed(_) => report.completed += 1,
                Step::Failed { status, .. } => {
                    report.failed += 1;
                    if status == TaskStatus::Dead {
                        report.dead += 1;
                    }
                }
            }
        }

        tracing::info!(
            completed = report.completed,
            failed = report.failed,
            dead = report.dead,
            "worker idle"
        );
        Ok(report)
    }

    /// One Running iteration: fetch at most one task and execute it.
    pub async fn step(&self) -> Result<Step, WorkerError> {
        if self.store.is_empty().await? {
            return Ok(Step::Idle);
        }
        // empty window between the two calls
        let Some(record) = self.store.fetch_pending().await? else {
            return Ok(Step::Idle);
        };
        let id = record.id;

        let span = tracing::info_span!("task", id = %id, kind = %record.kind);
        let result = {
            let ctx = ExecContext::new(id, self.store.as_ref());
            self.registry
                .execute(&record, &ctx)
                .instrument(span.clone())
                .await
        };

        match result {
            Ok(()) => {
                self.store.mark_complete(id).await?;
                span.in_scope(|| tracing::debug!("task complete"));
                Ok(Step::Completed(id))
            }
            Err(TaskError::Store(e)) => Err(WorkerError::Store(e)),
            Err(e) => {
                let status = self
                    .store
                    .record_failure(id, &e.to_string(), self.config.retry.max_attempts)
                    .await?;
                span.in_scope(|| match status {
                    TaskStatus::Dead => tracing::warn!(error = %e, "task failed; giving up"),
                    _ => tracing::warn!(error = %e, "task failed; will retry"),
                });
                Ok(Step::Failed { id, status })
            }
        }
    }
}
