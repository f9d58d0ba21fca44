//! RecordSink port - 抽出したレコードの受け取り先

use async_trait::async_trait;

use super::DetailRecord;

/// Receives every record extracted by a detail task.
///
/// A detail task may run more than once (at-least-once), so a sink can see
/// the same record twice.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn accept(&self, record: DetailRecord);
}
