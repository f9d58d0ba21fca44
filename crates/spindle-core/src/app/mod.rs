//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **WorkerLoop**: タスク実行ループ（fetch→handle→complete / record_failure）
//! - **RetryPolicy**: 失敗したタスクを何回まで再実行するか

pub mod builder;
pub mod retry;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::retry::RetryPolicy;
pub use self::worker_loop::{Step, WorkerConfig, WorkerLoop, WorkerReport, WorkerState};
