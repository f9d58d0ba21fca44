//! Fetcher port - 外部リソースの取得
//!
//! キャッシュもリトライも約束しない。失敗はそのままタスクの失敗になる。

use async_trait::async_trait;

use crate::domain::FetchError;

/// Retrieves the content behind a locator (a URL, usually).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}
