//! Errors - エラー型と分類
//!
//! # 分類
//! - タスクレベル（Fetch / Parse / Decode / UnknownKind）: タスクは Pending のまま残り、次のサイクルで再実行
//! - ストアレベル（Store）: ワーカーの呼び出し元まで伝播する（握りつぶさない）

use thiserror::Error;

use super::{TaskId, TaskKind};

/// The external resource could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("resource unavailable at {locator}: {reason}")]
    Unavailable { locator: String, reason: String },

    #[error("no resource at {0}")]
    NotFound(String),
}

/// Fetched content did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed content: {0}")]
    Malformed(String),
}

/// The durable store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage engine itself failed.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("corrupt row for {id}: {reason}")]
    Corrupt { id: TaskId, reason: String },

    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Failure while executing one task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("payload decode failed for kind={kind}: {reason}")]
    Decode { kind: TaskKind, reason: String },

    #[error("handler not found for kind={0}")]
    UnknownKind(TaskKind),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    /// Store failures end the worker invocation; everything else is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Store(_))
    }
}

/// Abnormal end of a worker invocation.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
