//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発・テスト用の正本
//! - **SqliteTaskStore**: 永続化された正本（sqlx + SQLite）
//! - **StaticSite**: 固定の対応表から返す Fetcher
//! - **LineFormat**: 1 行 1 指令のパーサ
//! - **LogSink / MemorySink**: 抽出レコードの受け取り先

pub mod inmem_store;
pub mod line_format;
pub mod sink;
pub mod sqlite_store;
pub mod static_site;

pub use self::inmem_store::InMemoryTaskStore;
pub use self::line_format::LineFormat;
pub use self::sink::{LogSink, MemorySink};
pub use self::sqlite_store::SqliteTaskStore;
pub use self::static_site::StaticSite;
