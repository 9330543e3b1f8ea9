//! Producer library for QA dataset generation
//!
//! A producer is one worker: it picks the category furthest behind its
//! weight, asks a generative service for a question/answer pair, and
//! commits the pair against the shared token budget.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use crate::core::{
    parse_response, select_category, FailureKind, ParsedPair, PromptHandler, RetryDecision, RetryPolicy, RetryRule,
    WordTokenCounter, Worker, WorkerStats,
};
pub use error::{ProducerError, ProducerResult};
pub use services::RealApiClient;
pub use traits::*;
pub use types::*;
