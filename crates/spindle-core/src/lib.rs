//! spindle-core
//!
//! Durable task queue driving a paginated crawl.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Fetcher, Parser, RecordSink）
//! - **app**: アプリケーションロジック（builder, worker_loop, retry）
//! - **typed**: 型付き Task API（Task trait, Handler trait, TypedRegistry, PayloadCodec）
//! - **impls**: 実装（InMemoryTaskStore, SqliteTaskStore, StaticSite, LineFormat）
//! - **crawl**: Discovery / ListingPage / DetailPage と共通実行テンプレート
//! - **config**: JSON 設定ファイル
//! - **observability**: キューの集計ビュー

pub mod app;
pub mod config;
pub mod crawl;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;
