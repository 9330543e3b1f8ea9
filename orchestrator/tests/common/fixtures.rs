//! Test fixtures: stub services and canned data

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use producer::{ApiClient, ProducerResult, RecordSink, TokenCounter};
use shared::{ApiFailure, CategoryWeights, QaRecord};

/// Canned test data
pub struct TestFixtures;

impl TestFixtures {
    pub fn three_to_one() -> CategoryWeights {
        CategoryWeights::from_pairs(vec![("A", 3), ("B", 1)]).unwrap()
    }

    pub fn single_category() -> CategoryWeights {
        CategoryWeights::from_pairs(vec![("Science", 1)]).unwrap()
    }

    /// Well-formed response mentioning the prompt's category
    pub fn response_for(prompt: &str) -> String {
        let topic = if prompt.contains("**A**") {
            "A"
        } else if prompt.contains("**B**") {
            "B"
        } else {
            "something"
        };
        format!("Q: What is a fact about {topic}?\nA: Here is a fact about {topic}.")
    }
}

/// Generative client stub that either answers or fails every call
pub struct StubClient {
    failure: Option<ApiFailure>,
    latency: Duration,
    calls: AtomicUsize,
}

impl StubClient {
    pub fn answering() -> Self {
        Self {
            failure: None,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(failure: ApiFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::answering()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiClient for StubClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(TestFixtures::response_for(prompt)),
        }
    }

    fn provider_name(&self) -> String {
        "stub".to_string()
    }
}

/// Client whose calls never complete
pub struct HangingClient;

#[async_trait]
impl ApiClient for HangingClient {
    async fn generate(&self, _prompt: &str) -> Result<String, ApiFailure> {
        std::future::pending().await
    }

    fn provider_name(&self) -> String {
        "hanging".to_string()
    }
}

/// Counts every text as the same number of tokens
pub struct FixedTokenCounter(pub u64);

impl TokenCounter for FixedTokenCounter {
    fn count(&self, _text: &str) -> u64 {
        self.0
    }
}

/// In-memory sink whose appends block a thread for `delay`
#[derive(Clone)]
pub struct SlowSink {
    delay: Duration,
    records: Arc<Mutex<Vec<QaRecord>>>,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<QaRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for SlowSink {
    async fn append(&self, record: &QaRecord) -> ProducerResult<()> {
        let delay = self.delay;
        let records = Arc::clone(&self.records);
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            std::thread::sleep(delay);
            records.lock().unwrap().push(record);
        })
        .await?;
        Ok(())
    }

    fn location(&self) -> String {
        "memory://slow".to_string()
    }
}
