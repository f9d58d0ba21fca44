//! Handler trait - Task を実行する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<T, H> → DynHandler)

use super::codec::PayloadCodec;
use super::task::Task;
use crate::domain::{NewTask, TaskError, TaskId, TaskRecord};
use crate::ports::TaskStore;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// What a handler gets to see besides its own payload.
///
/// The store is borrowed, not owned: handlers enqueue children through it but
/// never outlive one execution.
pub struct ExecContext<'a> {
    task_id: TaskId,
    store: &'a dyn TaskStore,
}

impl<'a> ExecContext<'a> {
    pub fn new(task_id: TaskId, store: &'a dyn TaskStore) -> Self {
        Self { task_id, store }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn store(&self) -> &'a dyn TaskStore {
        self.store
    }

    /// Enqueue the children of the running task in one batch.
    pub async fn enqueue_children(&self, children: Vec<NewTask>) -> Result<Vec<TaskId>, TaskError> {
        if children.is_empty() {
            return Ok(Vec::new());
        }
        let ids = self.store.enqueue_batch(children).await?;
        tracing::debug!(parent = %self.task_id, count = ids.len(), "enqueued child tasks");
        Ok(ids)
    }
}

/// Handler は Task を実行する
///
/// # ジェネリクスによる型安全性
/// - `Handler<ListingPage>` は `ListingPage` しか受け取れない
/// - コンパイル時に Task と Handler の対応が保証される
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T, ctx: &ExecContext<'_>) -> Result<(), TaskError>;
}

/// A shared handler is still a handler.
#[async_trait]
impl<T: Task, H: Handler<T> + ?Sized> Handler<T> for Arc<H> {
    async fn handle(&self, task: T, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        (**self).handle(task, ctx).await
    }
}

/// DynHandler は object-safe な Handler の抽象化
///
/// TypedHandler<T> を DynHandler に変換することで、
/// HashMap<String, Arc<dyn DynHandler>> に格納可能にします。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, record: &TaskRecord, ctx: &ExecContext<'_>) -> Result<(), TaskError>;
    fn kind(&self) -> &str;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, record: &TaskRecord, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let task: T = PayloadCodec::decode(record)?;
        self.handler.handle(task, ctx).await
    }

    fn kind(&self) -> &str {
        T::KIND
    }
}
