//! In-memory record sinks

#![allow(dead_code)] // Test utilities may not all be used by every test binary

use async_trait::async_trait;
use std::sync::Mutex;

use producer::{ProducerError, ProducerResult, RecordSink};
use shared::QaRecord;

/// Collects appended records in memory
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<QaRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<QaRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn total_cost(&self) -> u64 {
        self.records.lock().unwrap().iter().map(|r| r.cost).sum()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &QaRecord) -> ProducerResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Rejects every append
pub struct FailingSink;

#[async_trait]
impl RecordSink for FailingSink {
    async fn append(&self, _record: &QaRecord) -> ProducerResult<()> {
        Err(ProducerError::sink("disk full"))
    }

    fn location(&self) -> String {
        "failing".to_string()
    }
}
