//! Orchestrator library
//!
//! Validates a run, prepares the output sink, spawns the workers and
//! brings them down again, either when the shared budget runs out or when
//! a shutdown is requested.

pub mod error;
pub mod orchestrator;
pub mod services;
pub mod signals;
pub mod traits;

pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, RunSummary};
pub use traits::*;
