//! Test helpers and builder patterns for orchestrator tests

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use orchestrator::services::JsonlFileSink;
use orchestrator::{Orchestrator, OrchestratorResult};
use producer::{ApiClient, RecordSink, TokenCounter};
use shared::{CategoryWeights, QaRecord, RunConfig};

use super::fixtures::{FixedTokenCounter, TestFixtures};

/// Builder for orchestrators writing to a real JSONL file
pub struct OrchestratorBuilder {
    config: RunConfig,
}

impl OrchestratorBuilder {
    /// Defaults suited to tests: millisecond backoff, short grace period
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        let config = RunConfig::new(output_path, 1, 1_000, TestFixtures::three_to_one())
            .with_retry_unit(Duration::from_millis(1))
            .with_shutdown_grace(Duration::from_secs(5))
            .with_progress_interval(Duration::from_millis(50));
        Self { config }
    }

    pub fn with_workers(mut self, worker_count: u32) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    pub fn with_ceiling(mut self, token_ceiling: u64) -> Self {
        self.config.token_ceiling = token_ceiling;
        self
    }

    pub fn with_categories(mut self, categories: CategoryWeights) -> Self {
        self.config.categories = categories;
        self
    }

    pub fn with_retry_unit(mut self, unit: Duration) -> Self {
        self.config = self.config.with_retry_unit(unit);
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.config = self.config.with_shutdown_grace(grace);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_progress_interval(interval);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Build with a counter charging `tokens_per_text` for the question and again for the answer
    pub fn build<A: ApiClient + 'static>(
        self,
        client: A,
        tokens_per_text: u64,
    ) -> OrchestratorResult<Orchestrator<A, FixedTokenCounter, JsonlFileSink>> {
        self.build_with_counter(client, FixedTokenCounter(tokens_per_text))
    }

    pub fn build_with_counter<A: ApiClient + 'static, T: TokenCounter + 'static>(
        self,
        client: A,
        counter: T,
    ) -> OrchestratorResult<Orchestrator<A, T, JsonlFileSink>> {
        let sink = JsonlFileSink::new(&self.config.output_path);
        Orchestrator::new(self.config, client, counter, sink)
    }

    /// Build against a caller-supplied sink instead of the output file
    pub fn build_with_sink<A: ApiClient + 'static, S: RecordSink + 'static>(
        self,
        client: A,
        tokens_per_text: u64,
        sink: S,
    ) -> OrchestratorResult<Orchestrator<A, FixedTokenCounter, S>> {
        Orchestrator::new(self.config, client, FixedTokenCounter(tokens_per_text), sink)
    }
}

/// Assertions and file inspection helpers
pub struct TestHelpers;

impl TestHelpers {
    pub fn output_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("dataset.jsonl")
    }

    /// Parse every line of a JSONL output file
    pub fn read_records(path: &Path) -> Vec<QaRecord> {
        let content = fs::read_to_string(path).unwrap_or_default();
        content
            .lines()
            .map(|line| serde_json::from_str(line).expect("every line is a complete record"))
            .collect()
    }

    pub fn count_by_category(records: &[QaRecord]) -> HashMap<String, u64> {
        let mut counts = HashMap::new();
        for record in records {
            *counts.entry(record.category.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_cost(records: &[QaRecord]) -> u64 {
        records.iter().map(|r| r.cost).sum()
    }
}
