//! SqliteTaskStore - SQLite による永続ストア
//!
//! テーブル `tasks` の 1 行が 1 タスク。status は整数で保存する
//! （0 = pending, 1 = complete, 2 = dead）。
//!
//! ## Submodules
//! - [`migrations`] - スキーマのバージョン管理

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::domain::{NewTask, StoreError, TaskId, TaskKind, TaskRecord, TaskStatus};
use crate::observability::QueueCounts;
use crate::ports::TaskStore;

mod migrations;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(Box::new(e))
    }
}

impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Sqlite>>::encode_by_ref(&self.get(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(TaskId::new(id))
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, kind, payload, status, attempts, last_error, created_at, finished_at FROM tasks";

/// Task row as stored.
#[derive(Debug, FromRow)]
struct TaskRow {
    id: TaskId,
    kind: String,
    payload: String,
    status: i64,
    attempts: i64,
    last_error: Option<String>,
    created_at: i64,
    finished_at: Option<i64>,
}

impl TaskRow {
    fn into_record(self) -> Result<TaskRecord, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let status = TaskStatus::from_code(self.status)
            .ok_or_else(|| corrupt(format!("unknown status code {}", self.status)))?;
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| corrupt(format!("payload is not JSON: {e}")))?;
        let created_at = DateTime::<Utc>::from_timestamp(self.created_at, 0)
            .ok_or_else(|| corrupt(format!("bad created_at {}", self.created_at)))?;
        let finished_at = match self.finished_at {
            Some(ts) => Some(
                DateTime::<Utc>::from_timestamp(ts, 0)
                    .ok_or_else(|| corrupt(format!("bad finished_at {ts}")))?,
            ),
            None => None,
        };

        Ok(TaskRecord {
            id,
            kind: TaskKind::new(self.kind),
            payload,
            status,
            attempts: u32::try_from(self.attempts).unwrap_or(u32::MAX),
            last_error: self.last_error,
            created_at,
            finished_at,
        })
    }
}

/// Durable task store backed by SQLite.
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Open (or create) the database file at `path` and run migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(Box::new(e)))?;
        }

        // a file name, not a URL: `?` and non-UTF-8 bytes are taken literally
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.run_migrations().await?;
        tracing::info!(path = %path.display(), "task store opened");
        Ok(store)
    }

    /// Private in-memory database; gone when the store is dropped.
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn insert<'e, E>(executor: E, task: &NewTask) -> Result<TaskId, StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let payload = serde_json::to_string(task.payload())?;
        let result = sqlx::query(
            "INSERT INTO tasks (kind, payload, status, attempts, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(task.kind().as_str())
        .bind(payload)
        .bind(TaskStatus::Pending.code())
        .bind(Utc::now().timestamp())
        .execute(executor)
        .await?;
        Ok(TaskId::new(result.last_insert_rowid()))
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn enqueue(&self, task: NewTask) -> Result<TaskId, StoreError> {
        Self::insert(&self.pool, &task).await
    }

    async fn enqueue_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<TaskId>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(tasks.len());
        for task in &tasks {
            // dropping `tx` on error rolls the whole batch back
            ids.push(Self::insert(&mut *tx, task).await?);
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn fetch_pending(&self) -> Result<Option<TaskRecord>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "{SELECT_COLUMNS} WHERE status = ? ORDER BY id ASC LIMIT 1"
        ))
        .bind(TaskStatus::Pending.code())
        .fetch_optional(&self.pool)
        .await?;
        row.map(TaskRow::into_record).transpose()
    }

    async fn mark_complete(&self, id: TaskId) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE tasks SET status = ?, finished_at = ? WHERE id = ? AND status = ?")
                .bind(TaskStatus::Complete.code())
                .bind(Utc::now().timestamp())
                .bind(id)
                .bind(TaskStatus::Pending.code())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            let found: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if found == 0 {
                return Err(StoreError::NotFound(id));
            }
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        id: TaskId,
        error: &str,
        max_attempts: Option<u32>,
    ) -> Result<TaskStatus, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT status, attempts FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (status, attempts) = row.ok_or(StoreError::NotFound(id))?;
        let status = TaskStatus::from_code(status).ok_or_else(|| StoreError::Corrupt {
            id,
            reason: format!("unknown status code {status}"),
        })?;
        if status != TaskStatus::Pending {
            return Ok(status);
        }

        let attempts = attempts + 1;
        let next = if max_attempts.is_some_and(|max| attempts >= i64::from(max)) {
            TaskStatus::Dead
        } else {
            TaskStatus::Pending
        };
        let finished_at = next.is_terminal().then(|| Utc::now().timestamp());

        sqlx::query(
            "UPDATE tasks SET attempts = ?, last_error = ?, status = ?, finished_at = COALESCE(?, finished_at) WHERE id = ?",
        )
        .bind(attempts)
        .bind(error)
        .bind(next.code())
        .bind(finished_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(next)
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        let pending: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM tasks WHERE status = ?")
            .bind(TaskStatus::Pending.code())
            .fetch_one(&self.pool)
            .await?;
        Ok(pending == 0)
    }

    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskRow::into_record).transpose()
    }

    async fn list(&self) -> Result<Vec<TaskRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TaskRow::into_record).collect()
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT status, COUNT(id) FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = QueueCounts::default();
        for (code, n) in rows {
            let n = usize::try_from(n).unwrap_or(0);
            match TaskStatus::from_code(code) {
                Some(TaskStatus::Pending) => counts.pending += n,
                Some(TaskStatus::Complete) => counts.complete += n,
                Some(TaskStatus::Dead) => counts.dead += n,
                None => tracing::warn!(code, "ignoring rows with unknown status code"),
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TaskStoreExt;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn task(n: i32) -> NewTask {
        NewTask::new(TaskKind::new("test.kind.v1"), json!({ "n": n }))
    }

    #[tokio::test]
    async fn enqueue_then_fetch_oldest_first() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let a = store.enqueue(task(1)).await.unwrap();
        let b = store.enqueue(task(2)).await.unwrap();
        assert!(a < b);

        let first = store.fetch_pending().await.unwrap().unwrap();
        assert_eq!(first.id, a);
        assert_eq!(first.kind.as_str(), "test.kind.v1");
        assert_eq!(first.payload, json!({ "n": 1 }));
        assert_eq!(first.status, TaskStatus::Pending);

        store.mark_complete(a).await.unwrap();
        assert_eq!(store.fetch_pending().await.unwrap().unwrap().id, b);
        assert!(!store.is_empty().await.unwrap());

        store.mark_complete(b).await.unwrap();
        assert!(store.fetch_pending().await.unwrap().is_none());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn mark_complete_twice_leaves_same_state() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let id = store.enqueue(task(1)).await.unwrap();

        store.mark_complete(id).await.unwrap();
        let once = store.list().await.unwrap();
        store.mark_complete(id).await.unwrap();
        let twice = store.list().await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(once[0].status, TaskStatus::Complete);
        assert!(once[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn mark_complete_unknown_id() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let err = store.mark_complete(TaskId::new(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn batch_is_atomic_and_ordered() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let ids = store
            .enqueue_batch(vec![task(1), task(2), task(3)])
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.counts().await.unwrap().pending, 3);
    }

    #[tokio::test]
    async fn record_failure_counts_and_dead_letters() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let id = store.enqueue(task(1)).await.unwrap();

        assert_eq!(
            store.record_failure(id, "timeout", Some(2)).await.unwrap(),
            TaskStatus::Pending
        );
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.attempts, 1);
        assert_eq!(record.last_error.as_deref(), Some("timeout"));
        assert!(record.finished_at.is_none());

        assert_eq!(
            store.record_failure(id, "timeout again", Some(2)).await.unwrap(),
            TaskStatus::Dead
        );
        assert!(store.is_empty().await.unwrap());
        assert!(store.fetch_pending().await.unwrap().is_none());

        // dead is terminal: completion does not resurrect it
        store.mark_complete(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().status, TaskStatus::Dead);
    }

    #[tokio::test]
    async fn unbounded_failures_stay_pending() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let id = store.enqueue(task(1)).await.unwrap();
        for _ in 0..3 {
            assert_eq!(
                store.record_failure(id, "nope", None).await.unwrap(),
                TaskStatus::Pending
            );
        }
        assert_eq!(store.get(id).await.unwrap().unwrap().attempts, 3);
    }

    #[derive(Serialize, Deserialize)]
    struct NonStringKeys {
        map: HashMap<Vec<u8>, String>,
    }

    impl crate::typed::Task for NonStringKeys {
        const KIND: &'static str = "test.broken.v1";
    }

    #[tokio::test]
    async fn unserializable_payload_writes_nothing() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let mut map = HashMap::new();
        map.insert(vec![0u8], "x".to_string());

        let err = store.enqueue_task(&NonStringKeys { map }).await.unwrap_err();

        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_work_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue").join("tasks.db");

        let (done, open) = {
            let store = SqliteTaskStore::open(&path).await.unwrap();
            let done = store.enqueue(task(1)).await.unwrap();
            let open = store.enqueue(task(2)).await.unwrap();
            store.mark_complete(done).await.unwrap();
            store.close().await;
            (done, open)
        };

        let store = SqliteTaskStore::open(&path).await.unwrap();
        let pending = store.fetch_pending().await.unwrap().unwrap();
        assert_eq!(pending.id, open);
        assert_eq!(pending.payload, json!({ "n": 2 }));
        assert_eq!(
            store.get(done).await.unwrap().unwrap().status,
            TaskStatus::Complete
        );

        // ids keep increasing after a restart
        let next = store.enqueue(task(3)).await.unwrap();
        assert!(next > open);
    }

    #[tokio::test]
    async fn file_name_is_not_parsed_as_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawl?v1.db");

        let store = SqliteTaskStore::open(&path).await.unwrap();
        store.enqueue(task(1)).await.unwrap();
        store.close().await;

        assert!(path.exists());
        let store = SqliteTaskStore::open(&path).await.unwrap();
        assert_eq!(store.counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn closed_pool_is_a_backend_error() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        store.close().await;
        let err = store.enqueue(task(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn task_fetched_before_crash_runs_once_after_reopen() {
        use crate::app::{WorkerConfig, WorkerLoop};
        use crate::typed::TypedRegistry;
        use crate::typed::handler::fixtures::EchoHandler;
        use crate::typed::task::fixtures::EchoTask;
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");

        // the first process fetches the task and dies before completing it
        let id = {
            let store = SqliteTaskStore::open(&path).await.unwrap();
            let id = store.enqueue_task(&EchoTask { value: 7 }).await.unwrap();
            assert_eq!(store.fetch_pending().await.unwrap().unwrap().id, id);
            store.close().await;
            id
        };

        let store = Arc::new(SqliteTaskStore::open(&path).await.unwrap());
        let handler = Arc::new(EchoHandler::default());
        let mut registry = TypedRegistry::new();
        registry
            .register::<EchoTask, _>(Arc::clone(&handler))
            .unwrap();
        let worker = WorkerLoop::new(store.clone(), Arc::new(registry), WorkerConfig::default());

        assert_eq!(worker.run().await.unwrap().completed, 1);
        assert_eq!(worker.run().await.unwrap().completed, 0);

        assert_eq!(*handler.seen.lock().unwrap(), vec![7]);
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Complete);
        assert_eq!(record.attempts, 0);
    }
}
