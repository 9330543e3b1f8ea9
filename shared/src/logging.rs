//! Tracing setup and the log vocabulary shared by the orchestrator and its workers
//!
//! Every event carries the emitting `process` and `t_ms`, the milliseconds
//! since logging started, so interleaved worker lines of one run can be
//! ordered without parsing wall-clock timestamps.

use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::budget::BudgetSnapshot;
use crate::types::ProcessId;

static RUN_CLOCK: OnceLock<Instant> = OnceLock::new();

/// Default per-crate filter for the given base level
pub fn default_filter(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("orchestrator={base_level},producer={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize tracing with an optional log level and start the run clock
///
/// `RUST_LOG` takes precedence over the level passed in. Later calls are ignored.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    RUN_CLOCK.get_or_init(Instant::now);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .try_init();
}

/// Milliseconds since tracing was initialised (or since the first event)
pub fn elapsed_ms() -> u64 {
    RUN_CLOCK.get_or_init(Instant::now).elapsed().as_millis() as u64
}

#[doc(hidden)]
#[macro_export]
macro_rules! process_event {
    ($level:ident, $process_id:expr, $($arg:tt)*) => {
        tracing::$level!(process = %$process_id, t_ms = $crate::logging::elapsed_ms(), $($arg)*)
    };
}

#[macro_export]
macro_rules! process_info {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(info, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_warn {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(warn, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_error {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(error, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_debug {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(debug, $process_id, $($arg)*)
    };
}

/// "spent / ceiling tokens (pct%), remaining left"
pub fn budget_line(snapshot: &BudgetSnapshot) -> String {
    format!(
        "{} / {} tokens ({:.1}%), {} left",
        snapshot.spent,
        snapshot.ceiling,
        snapshot.percent_spent(),
        snapshot.remaining()
    )
}

pub fn log_run_started(process_id: &ProcessId, workers: u32, provider: &str, ceiling: u64) {
    info!(
        process = %process_id,
        t_ms = elapsed_ms(),
        workers,
        provider,
        ceiling,
        "🚀 Starting run: {workers} workers against {provider}, budget {ceiling} tokens"
    );
}

/// Periodic budget report
pub fn log_budget(process_id: &ProcessId, snapshot: &BudgetSnapshot) {
    info!(
        process = %process_id,
        t_ms = elapsed_ms(),
        spent = snapshot.spent,
        ceiling = snapshot.ceiling,
        "📋 Budget: {}",
        budget_line(snapshot)
    );
}

pub fn log_stop_requested(process_id: &ProcessId, reason: &str) {
    warn!(process = %process_id, t_ms = elapsed_ms(), "🛑 Stopping: {reason}");
}

pub fn log_failure(process_id: &ProcessId, context: &str, error: &dyn fmt::Display) {
    error!(
        process = %process_id,
        t_ms = elapsed_ms(),
        error = %error,
        "❌ {context} failed"
    );
}

pub fn log_run_finished(process_id: &ProcessId, items: u64, snapshot: &BudgetSnapshot, location: &str) {
    info!(
        process = %process_id,
        t_ms = elapsed_ms(),
        items,
        "✅ Run finished: {items} items, {}, output {location}",
        budget_line(snapshot)
    );
}
