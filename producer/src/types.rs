//! Worker-specific data types

use serde::Serialize;
use std::collections::HashMap;

use crate::core::metrics::WorkerStats;
use shared::{Category, CategoryWeights, ProcessId, QaRecord};

/// Items a single worker has committed per category
///
/// Owned by exactly one worker and never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCounts {
    counts: HashMap<Category, u64>,
}

impl LocalCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every configured category at zero
    pub fn for_categories(weights: &CategoryWeights) -> Self {
        Self {
            counts: weights.categories().map(|c| (c.clone(), 0)).collect(),
        }
    }

    pub fn get(&self, category: &Category) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, category: &Category) {
        *self.counts.entry(category.clone()).or_insert(0) += 1;
    }

    pub fn set(&mut self, category: impl Into<Category>, count: u64) {
        self.counts.insert(category.into(), count);
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Parsed service output waiting for a budget decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub cost: u64,
}

impl From<CandidateItem> for QaRecord {
    fn from(item: CandidateItem) -> Self {
        QaRecord {
            question: item.question,
            answer: item.answer,
            category: item.category,
            cost: item.cost,
        }
    }
}

/// Why a worker reached its terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The shared budget could not take another item
    BudgetExhausted,
    /// The orchestrator asked all workers to stop
    ShutdownRequested,
    /// Appending to the output sink failed
    SinkFailed(String),
    /// The retry policy declined to continue after a service failure
    RetryAbandoned(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::BudgetExhausted => write!(f, "budget exhausted"),
            StopReason::ShutdownRequested => write!(f, "shutdown requested"),
            StopReason::SinkFailed(message) => write!(f, "sink failed: {message}"),
            StopReason::RetryAbandoned(message) => write!(f, "gave up after: {message}"),
        }
    }
}

/// Worker loop states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Selecting,
    Requesting(Category),
    Parsing { category: Category, content: String },
    Committing(CandidateItem),
    Stopped(StopReason),
}

/// Final account of one worker, returned when it stops
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub worker: ProcessId,
    pub stop_reason: StopReason,
    pub stats: WorkerStats,
}
