//! Ctrl+C handling for the binary
//!
//! The first interrupt asks the orchestrator to stop gracefully. A second
//! one means the user does not want to wait for the grace period.

use std::future::Future;
use std::io;
use tokio::sync::mpsc;

use shared::{logging, ProcessId};

/// Exit status for a forced exit after a second interrupt (128 + SIGINT)
pub const FORCED_EXIT_CODE: i32 = 130;

/// Forward the first interrupt to `shutdown`, then resolve on the second
///
/// `next_interrupt` is called once per interrupt to wait for; in the binary
/// it is `tokio::signal::ctrl_c`.
pub async fn watch_interrupts<F, Fut>(mut next_interrupt: F, shutdown: mpsc::Sender<()>) -> io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let id = ProcessId::Orchestrator;

    next_interrupt().await?;
    logging::log_stop_requested(&id, "received Ctrl+C, press again to exit immediately");
    let _ = shutdown.send(()).await;

    next_interrupt().await?;
    logging::log_stop_requested(&id, "received second Ctrl+C, exiting without waiting for workers");
    Ok(())
}
