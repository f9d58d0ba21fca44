//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use super::worker_loop::{WorkerConfig, WorkerLoop};
use crate::domain::{StoreError, TaskId};
use crate::ports::{TaskStore, TaskStoreExt};
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(store)
///     .register::<Discovery, _>(discovery_handler)?
///     .expect_tasks(&["crawl.discovery.v1"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_tasks() で期待される kind を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
pub struct AppBuilder {
    store: Arc<dyn TaskStore>,
    registry: TypedRegistry,
    expected_tasks: Option<Vec<String>>,
    worker: WorkerConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task kinds: {0:?}. These tasks were expected but not registered.")]
    MissingTaskTypes(Vec<String>),
}

impl AppBuilder {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            registry: TypedRegistry::new(),
            expected_tasks: None,
            worker: WorkerConfig::default(),
        }
    }

    /// Handler を登録
    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    /// 期待される kind のリストを設定
    pub fn expect_tasks(mut self, kinds: &[&str]) -> Self {
        self.expected_tasks = Some(kinds.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker = config;
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - expect_tasks() で設定された kind が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingTaskTypes を返す
    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let registered = self.registry.registered_kinds();
            let missing: Vec<String> = expected_tasks
                .iter()
                .filter(|x| !registered.contains(x))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing));
            }
        }
        tracing::debug!(kinds = ?self.registry.registered_kinds(), "app built");
        Ok(App {
            store: self.store,
            registry: Arc::new(self.registry),
            worker: self.worker,
        })
    }
}

/// App はアプリケーションのランタイム
///
/// TaskStore と TypedRegistry を束ね、ワーカーを生成する。
pub struct App {
    store: Arc<dyn TaskStore>,
    registry: Arc<TypedRegistry>,
    worker: WorkerConfig,
}

impl App {
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn registry(&self) -> &TypedRegistry {
        &self.registry
    }

    pub fn worker(&self) -> WorkerLoop {
        WorkerLoop::new(Arc::clone(&self.store), Arc::clone(&self.registry), self.worker)
    }

    /// Enqueue `task` only when nothing is Pending.
    ///
    /// A restarted process resumes the existing backlog instead of starting
    /// a second crawl. Returns the new id, or `None` when the store already
    /// had work.
    pub async fn seed_if_empty<T: Task>(&self, task: &T) -> Result<Option<TaskId>, StoreError> {
        if !self.store.is_empty().await? {
            tracing::info!("resuming pending tasks");
            return Ok(None);
        }
        let id = self.store.enqueue_task(task).await?;
        tracing::info!(%id, kind = T::KIND, "seeded");
        Ok(Some(id))
    }
}
