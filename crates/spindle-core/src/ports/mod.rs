//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（永続ストア、HTTP、マークアップ解析など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - TaskStore が source of truth（正本）
//! - Fetcher / Parser はタスクから注入される協力者で、状態を持たない

pub mod fetcher;
pub mod parser;
pub mod record_sink;
pub mod task_store;

pub use self::fetcher::Fetcher;
pub use self::parser::{CategoryParser, DetailParser, DetailRecord, ListingContent, ListingParser};
pub use self::record_sink::RecordSink;
pub use self::task_store::{TaskStore, TaskStoreExt};
