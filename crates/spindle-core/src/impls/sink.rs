//! RecordSink の実装

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{DetailRecord, RecordSink};

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl RecordSink for LogSink {
    async fn accept(&self, record: DetailRecord) {
        tracing::info!(url = %record.url, title = %record.title, "parsed detail record");
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DetailRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DetailRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn accept(&self, record: DetailRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}
