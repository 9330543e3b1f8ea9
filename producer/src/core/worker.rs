//! Worker loop
//!
//! Each worker runs an explicit state machine:
//!
//! ```text
//! Selecting -> Requesting -> Parsing -> Committing -> Selecting
//!     |            |  (failure: backoff)     |
//!     +------------+-----> Stopped <---------+
//! ```
//!
//! The stop signal is observed at the top of `Selecting` and while sleeping
//! off a backoff. An in-flight service call is never cancelled by the
//! worker itself.

use std::sync::Arc;
use tokio::sync::watch;

use super::metrics::WorkerStats;
use super::processor::parse_response;
use super::prompt::PromptHandler;
use super::retry::{FailureKind, RetryPolicy};
use super::selector::select_category;
use crate::traits::{ApiClient, RecordSink, TokenCounter};
use crate::types::{CandidateItem, LocalCounts, StopReason, WorkerReport, WorkerState};
use shared::{process_debug, process_error, process_info, process_warn};
use shared::{BudgetGuard, Category, CategoryWeights, ProcessId, QaRecord};

/// One generation worker
pub struct Worker<A, T, S>
where
    A: ApiClient + 'static,
    T: TokenCounter + 'static,
    S: RecordSink + 'static,
{
    id: ProcessId,
    categories: Arc<CategoryWeights>,

    // Dependencies (shared with the other workers)
    api_client: Arc<A>,
    token_counter: Arc<T>,
    sink: Arc<S>,
    budget: Arc<BudgetGuard>,

    retry_policy: RetryPolicy,
    prompt_handler: PromptHandler,

    // Owned exclusively by this worker
    local_counts: LocalCounts,
    stats: WorkerStats,
}

impl<A, T, S> Worker<A, T, S>
where
    A: ApiClient + 'static,
    T: TokenCounter + 'static,
    S: RecordSink + 'static,
{
    pub fn new(
        id: u32,
        categories: Arc<CategoryWeights>,
        api_client: Arc<A>,
        token_counter: Arc<T>,
        sink: Arc<S>,
        budget: Arc<BudgetGuard>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let local_counts = LocalCounts::for_categories(&categories);
        Self {
            id: ProcessId::Worker(id),
            categories,
            api_client,
            token_counter,
            sink,
            budget,
            retry_policy,
            prompt_handler: PromptHandler::new(),
            local_counts,
            stats: WorkerStats::new(),
        }
    }

    pub fn with_prompt_handler(mut self, prompt_handler: PromptHandler) -> Self {
        self.prompt_handler = prompt_handler;
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn local_counts(&self) -> &LocalCounts {
        &self.local_counts
    }

    /// Run until the budget is exhausted or `stop` turns true
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> WorkerReport {
        self.stats.start();
        process_debug!(self.id, "Worker started");

        let mut state = WorkerState::Selecting;
        let stop_reason = loop {
            state = match state {
                WorkerState::Selecting => self.select(&stop).await,
                WorkerState::Requesting(category) => self.request(category, &mut stop).await,
                WorkerState::Parsing { category, content } => self.parse(category, &content),
                WorkerState::Committing(item) => self.commit(item).await,
                WorkerState::Stopped(reason) => break reason,
            };
        };

        self.stats.stop();
        process_info!(
            self.id,
            committed = self.stats.items_committed,
            tokens = self.stats.tokens_committed,
            failures = self.stats.total_failures(),
            malformed = self.stats.malformed_discarded,
            "🛑 Worker stopped: {}",
            stop_reason
        );

        WorkerReport {
            worker: self.id,
            stop_reason,
            stats: self.stats,
        }
    }

    async fn select(&self, stop: &watch::Receiver<bool>) -> WorkerState {
        if *stop.borrow() {
            return WorkerState::Stopped(StopReason::ShutdownRequested);
        }
        if self.budget.remaining().await == 0 {
            return WorkerState::Stopped(StopReason::BudgetExhausted);
        }

        let category = select_category(&self.local_counts, &self.categories);
        WorkerState::Requesting(category.clone())
    }

    async fn request(&mut self, category: Category, stop: &mut watch::Receiver<bool>) -> WorkerState {
        let prompt = self.prompt_handler.build_prompt(&category);
        self.stats.record_request();

        match self.api_client.generate(&prompt).await {
            Ok(content) => WorkerState::Parsing { category, content },
            Err(failure) => {
                let kind = FailureKind::from(&failure);
                let decision = self.retry_policy.decide(kind);
                self.stats.record_failure(kind);

                process_warn!(
                    self.id,
                    provider = %self.api_client.provider_name(),
                    category = %category,
                    backoff_ms = decision.delay.as_millis() as u64,
                    "⚠️ Request failed ({:?}): {}",
                    kind,
                    failure
                );

                if !decision.should_continue {
                    return WorkerState::Stopped(StopReason::RetryAbandoned(failure.to_string()));
                }

                // A stop request cuts the backoff short; Selecting then observes it
                tokio::select! {
                    _ = tokio::time::sleep(decision.delay) => {}
                    Ok(()) = stop.changed() => {}
                }
                WorkerState::Selecting
            }
        }
    }

    fn parse(&mut self, category: Category, content: &str) -> WorkerState {
        match parse_response(content) {
            Some(pair) => {
                let cost = self.token_counter.count(&pair.question) + self.token_counter.count(&pair.answer);
                WorkerState::Committing(CandidateItem {
                    question: pair.question,
                    answer: pair.answer,
                    category,
                    cost,
                })
            }
            None => {
                self.stats.record_malformed();
                process_debug!(self.id, category = %category, "Discarding response without Q/A markers");
                WorkerState::Selecting
            }
        }
    }

    async fn commit(&mut self, item: CandidateItem) -> WorkerState {
        let record = QaRecord::from(item);
        let sink = Arc::clone(&self.sink);
        let pending = record.clone();

        let write = move || async move { sink.append(&pending).await };
        match self.budget.commit_with(record.cost, write).await {
            Ok(true) => {
                self.local_counts.increment(&record.category);
                self.stats.record_commit(&record.category, record.cost);
                process_debug!(
                    self.id,
                    category = %record.category,
                    cost = record.cost,
                    "Committed item"
                );
                WorkerState::Selecting
            }
            Ok(false) => {
                process_debug!(self.id, cost = record.cost, "Item does not fit remaining budget");
                WorkerState::Stopped(StopReason::BudgetExhausted)
            }
            Err(e) => {
                process_error!(self.id, error = %e, "❌ Failed to append record to {}", self.sink.location());
                WorkerState::Stopped(StopReason::SinkFailed(e.to_string()))
            }
        }
    }
}
