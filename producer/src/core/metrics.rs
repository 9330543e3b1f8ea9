//! Per-worker counters

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::retry::FailureKind;
use shared::Category;

/// Counters a worker keeps about its own loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerStats {
    pub requests_sent: u64,
    pub items_committed: u64,
    pub tokens_committed: u64,
    pub malformed_discarded: u64,
    pub rate_limited: u64,
    pub service_errors: u64,
    pub unknown_errors: u64,
    pub per_category: BTreeMap<Category, u64>,
    #[serde(skip)]
    started_at: Option<Instant>,
    #[serde(skip)]
    stopped_at: Option<Instant>,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        self.stopped_at = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(self.stopped_at.unwrap_or_else(Instant::now).duration_since(started))
    }

    pub fn record_request(&mut self) {
        self.requests_sent += 1;
    }

    pub fn record_commit(&mut self, category: &Category, cost: u64) {
        self.items_committed += 1;
        self.tokens_committed += cost;
        *self.per_category.entry(category.clone()).or_insert(0) += 1;
    }

    pub fn record_malformed(&mut self) {
        self.malformed_discarded += 1;
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::RateLimited => self.rate_limited += 1,
            FailureKind::TransientServiceError => self.service_errors += 1,
            FailureKind::Unknown => self.unknown_errors += 1,
        }
    }

    pub fn total_failures(&self) -> u64 {
        self.rate_limited + self.service_errors + self.unknown_errors
    }

    /// Fold another worker's counters into this one
    pub fn merge(&mut self, other: &WorkerStats) {
        self.requests_sent += other.requests_sent;
        self.items_committed += other.items_committed;
        self.tokens_committed += other.tokens_committed;
        self.malformed_discarded += other.malformed_discarded;
        self.rate_limited += other.rate_limited;
        self.service_errors += other.service_errors;
        self.unknown_errors += other.unknown_errors;
        for (category, count) in &other.per_category {
            *self.per_category.entry(category.clone()).or_insert(0) += count;
        }
    }
}
