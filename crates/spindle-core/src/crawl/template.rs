//! Scraper - 全 kind 共通の実行テンプレート
//!
//! # フロー（順序はどの kind でも同じ）
//! 1. locator を決める
//! 2. Fetcher で取得
//! 3. Parser で構造化
//! 4. 子タスクを作る（必要なら同じ kind の後続ページも）
//! 5. まとめて enqueue
//! 6. 完了を返す（Complete にするのはワーカー）
//!
//! 取得か解析で失敗したら子タスクは一つも enqueue されない。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{NewTask, TaskError};
use crate::ports::{DetailRecord, Fetcher, RecordSink};
use crate::typed::{ExecContext, Handler, Task};

/// What one execution derived from the fetched content.
#[derive(Debug, Default)]
pub struct Derived {
    /// Child tasks, continuation included, in enqueue order.
    pub children: Vec<NewTask>,
    pub record: Option<DetailRecord>,
}

/// The parts of the template that vary per kind.
pub trait ScrapeStep: Send + Sync + 'static {
    type Task: Task;

    /// Step 1.
    fn locator(&self, task: &Self::Task) -> String;

    /// Steps 3 to 5. Must not have side effects: nothing is persisted until
    /// the whole result is known.
    fn derive(&self, task: &Self::Task, locator: &str, content: &str) -> Result<Derived, TaskError>;
}

/// Runs a [`ScrapeStep`] through the shared template.
pub struct Scraper<S> {
    step: S,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
}

impl<S: ScrapeStep> Scraper<S> {
    pub fn new(step: S, fetcher: Arc<dyn Fetcher>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            step,
            fetcher,
            sink,
        }
    }
}

#[async_trait]
impl<S: ScrapeStep> Handler<S::Task> for Scraper<S> {
    async fn handle(&self, task: S::Task, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let locator = self.step.locator(&task);
        let content = self.fetcher.fetch(&locator).await?;
        tracing::debug!(task = %ctx.task_id(), %locator, bytes = content.len(), "fetched");

        let derived = self.step.derive(&task, &locator, &content)?;
        ctx.enqueue_children(derived.children).await?;

        if let Some(record) = derived.record {
            self.sink.accept(record).await;
        }
        Ok(())
    }
}
