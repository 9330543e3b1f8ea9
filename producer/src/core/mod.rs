//! Worker core logic

pub mod metrics;
pub mod processor;
pub mod prompt;
pub mod retry;
pub mod selector;
pub mod tokens;
pub mod worker;

pub use metrics::WorkerStats;
pub use processor::{parse_response, ParsedPair};
pub use prompt::PromptHandler;
pub use retry::{FailureKind, RetryDecision, RetryPolicy, RetryRule};
pub use selector::select_category;
pub use tokens::WordTokenCounter;
pub use worker::Worker;
