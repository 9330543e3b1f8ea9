//! Shared types for the QA dataset generation system
//!
//! Holds what both the orchestrator and its workers need to agree on:
//! category configuration, the persisted record format, the shared token
//! budget and logging conventions.

pub mod budget;
pub mod config;
pub mod errors;
pub mod logging;
pub mod types;

pub use budget::{BudgetGuard, BudgetSnapshot};
pub use config::{GenerationConfig, RunConfig};
pub use errors::*;
pub use types::*;
