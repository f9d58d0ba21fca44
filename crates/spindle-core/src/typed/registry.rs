//! TypedRegistry - Handler の登録と管理
//!
//! kind 文字列から Handler を引く再構築テーブル。
//! 保存された `TaskRecord` はここを通って型付き Task に戻り、実行される。

use super::handler::{DynHandler, ExecContext, Handler, TypedHandler};
use super::task::Task;
use crate::domain::{TaskError, TaskRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// TypedRegistry は型付き Handler を登録・管理
///
/// # 使用例
/// ```ignore
/// let mut registry = TypedRegistry::new();
/// registry.register::<ListingPage, _>(listing_handler)?;
///
/// registry.execute(&record, &ctx).await?;
/// ```
///
/// Built during initialization (mutable), used during the worker run
/// (immutable), so no locks are needed.
#[derive(Default)]
pub struct TypedRegistry {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

/// RegistryError は TypedRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for task kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl TypedRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        let kind = T::KIND.to_string();
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        let typed_handler = TypedHandler::new(handler);
        self.handlers.insert(kind, Arc::new(typed_handler));
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(kind).cloned()
    }

    pub fn registered_kinds(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Dispatch one stored record to the handler of its kind.
    pub async fn execute(&self, record: &TaskRecord, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let handler = self
            .get(record.kind.as_str())
            .ok_or_else(|| TaskError::UnknownKind(record.kind.clone()))?;
        handler.handle_dyn(record, ctx).await
    }
}
