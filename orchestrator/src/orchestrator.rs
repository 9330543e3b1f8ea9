//! Main orchestrator implementation
//!
//! Owns one generation run: it validates the configuration, prepares the
//! output sink, spawns `worker_count` workers sharing a single budget and
//! collects their reports.
//!
//! Shutdown protocol:
//!
//! 1. A shutdown request (see [`Orchestrator::get_shutdown_sender`]) flips
//!    the workers' stop signal.
//! 2. Workers finish their current step and stop; backoff sleeps are cut
//!    short.
//! 3. Workers still running after `shutdown_grace` are aborted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, sleep, Instant};

use producer::{ApiClient, RecordSink, RetryPolicy, TokenCounter, Worker, WorkerReport, WorkerStats};
use shared::{logging, process_debug, process_error, process_info, BudgetGuard, BudgetSnapshot, ProcessId, RunConfig};

use crate::error::OrchestratorResult;

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_spent: u64,
    pub ceiling: u64,
    pub output_location: String,
    /// A shutdown was requested before the budget ran out
    pub interrupted: bool,
    /// Workers still running when the grace period ended
    pub aborted_workers: u32,
    pub workers: Vec<WorkerReport>,
    pub totals: WorkerStats,
}

impl RunSummary {
    pub fn items_committed(&self) -> u64 {
        self.totals.items_committed
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final token count: {} / {}", self.total_spent, self.ceiling)?;
        writeln!(
            f,
            "Items written: {} in {}s",
            self.totals.items_committed,
            self.duration().num_seconds()
        )?;
        for (category, count) in &self.totals.per_category {
            writeln!(f, "  {category}: {count}")?;
        }
        writeln!(
            f,
            "Failures: {} rate limited, {} service, {} unknown; {} malformed responses discarded",
            self.totals.rate_limited, self.totals.service_errors, self.totals.unknown_errors, self.totals.malformed_discarded
        )?;
        if self.interrupted {
            writeln!(f, "Run interrupted ({} workers aborted after grace period)", self.aborted_workers)?;
        }
        write!(f, "Dataset generation complete. Output saved to {}", self.output_location)
    }
}

/// Main orchestrator that coordinates the workers of one run
pub struct Orchestrator<A, T, S>
where
    A: ApiClient + 'static,
    T: TokenCounter + 'static,
    S: RecordSink + 'static,
{
    config: RunConfig,

    /// Injected services, shared by every worker
    api_client: Arc<A>,
    token_counter: Arc<T>,
    sink: Arc<S>,
    budget: Arc<BudgetGuard>,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<A, T, S> Orchestrator<A, T, S>
where
    A: ApiClient + 'static,
    T: TokenCounter + 'static,
    S: RecordSink + 'static,
{
    /// Validate `config` and wire the services; nothing is spawned or written yet
    pub fn new(config: RunConfig, api_client: A, token_counter: T, sink: S) -> OrchestratorResult<Self> {
        config.validate()?;

        let budget = Arc::new(BudgetGuard::new(config.token_ceiling));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            config,
            api_client: Arc::new(api_client),
            token_counter: Arc::new(token_counter),
            sink: Arc::new(sink),
            budget,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get shutdown sender for graceful shutdown
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn budget(&self) -> Arc<BudgetGuard> {
        Arc::clone(&self.budget)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run until every worker has stopped
    pub async fn run(&mut self) -> OrchestratorResult<RunSummary> {
        let id = ProcessId::Orchestrator;
        let started_at = Utc::now();
        logging::log_run_started(
            &id,
            self.config.worker_count,
            &self.api_client.provider_name(),
            self.config.token_ceiling,
        );

        self.sink.prepare().await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut workers = self.spawn_workers(&stop_rx);

        let mut reports = Vec::new();
        let mut progress = interval_at(
            Instant::now() + self.config.progress_interval,
            self.config.progress_interval,
        );

        let mut interrupted = false;
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(result) => Self::collect(result, &mut reports),
                    None => break,
                },
                _ = progress.tick() => self.report_progress().await,
                Some(()) = self.shutdown_rx.recv() => {
                    logging::log_stop_requested(&id, "shutdown requested, waiting for workers");
                    interrupted = true;
                    let _ = stop_tx.send(true);
                    break;
                }
            }
        }

        let aborted_workers = if interrupted {
            self.drain_with_grace(&mut workers, &mut reports).await
        } else {
            0
        };

        let summary = self.summarize(started_at, reports, interrupted, aborted_workers).await;
        logging::log_run_finished(
            &id,
            summary.items_committed(),
            &BudgetSnapshot {
                spent: summary.total_spent,
                ceiling: summary.ceiling,
            },
            &summary.output_location,
        );
        Ok(summary)
    }

    fn spawn_workers(&self, stop_rx: &watch::Receiver<bool>) -> JoinSet<WorkerReport> {
        let categories = Arc::new(self.config.categories.clone());
        let mut workers = JoinSet::new();

        for worker_id in 0..self.config.worker_count {
            let worker = Worker::new(
                worker_id,
                Arc::clone(&categories),
                Arc::clone(&self.api_client),
                Arc::clone(&self.token_counter),
                Arc::clone(&self.sink),
                Arc::clone(&self.budget),
                RetryPolicy::new(self.config.retry_unit),
            );
            workers.spawn(worker.run(stop_rx.clone()));
        }

        process_debug!(ProcessId::Orchestrator, "Spawned {} workers", self.config.worker_count);
        workers
    }

    /// Wait up to `shutdown_grace` for the remaining workers, then abort the rest
    async fn drain_with_grace(&self, workers: &mut JoinSet<WorkerReport>, reports: &mut Vec<WorkerReport>) -> u32 {
        let deadline = sleep(self.config.shutdown_grace);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(result) => Self::collect(result, reports),
                    None => return 0,
                },
                _ = &mut deadline => break,
            }
        }

        process_error!(
            ProcessId::Orchestrator,
            remaining = workers.len(),
            "❌ Workers did not stop within {:?}, aborting",
            self.config.shutdown_grace
        );
        workers.abort_all();

        let mut aborted = 0;
        while let Some(result) = workers.join_next().await {
            match result {
                Err(e) if e.is_cancelled() => aborted += 1,
                other => Self::collect(other, reports),
            }
        }
        aborted
    }

    fn collect(result: Result<WorkerReport, JoinError>, reports: &mut Vec<WorkerReport>) {
        match result {
            Ok(report) => {
                process_debug!(report.worker, "Report received: {}", report.stop_reason);
                reports.push(report);
            }
            Err(e) => logging::log_failure(&ProcessId::Orchestrator, "Worker task", &e),
        }
    }

    async fn report_progress(&self) {
        logging::log_budget(&ProcessId::Orchestrator, &self.budget.snapshot().await);
    }

    async fn summarize(
        &self,
        started_at: DateTime<Utc>,
        mut reports: Vec<WorkerReport>,
        interrupted: bool,
        aborted_workers: u32,
    ) -> RunSummary {
        reports.sort_by_key(|report| match report.worker {
            ProcessId::Worker(n) => n,
            ProcessId::Orchestrator => u32::MAX,
        });

        let mut totals = WorkerStats::new();
        for report in &reports {
            totals.merge(&report.stats);
        }

        let snapshot = self.budget.snapshot().await;
        process_info!(
            ProcessId::Orchestrator,
            workers = reports.len(),
            aborted = aborted_workers,
            "Collected worker reports"
        );

        RunSummary {
            started_at,
            finished_at: Utc::now(),
            total_spent: snapshot.spent,
            ceiling: snapshot.ceiling,
            output_location: self.sink.location(),
            interrupted,
            aborted_workers,
            workers: reports,
            totals,
        }
    }
}
