//! Producer trait definitions for dependency injection

use async_trait::async_trait;

use crate::error::ProducerResult;
use shared::{ApiFailure, QaRecord};

/// Generative service client
#[mockall::automock]
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Send one prompt and return the raw response text
    async fn generate(&self, prompt: &str) -> Result<String, ApiFailure>;

    /// Provider name for diagnostics
    fn provider_name(&self) -> String;
}

/// Deterministic, side-effect free token counting
#[mockall::automock]
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u64;
}

/// Append-only destination for committed records
#[mockall::automock]
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Make the sink ready before any worker appends
    async fn prepare(&self) -> ProducerResult<()> {
        Ok(())
    }

    /// Append one record as a single, non-interleaved write
    async fn append(&self, record: &QaRecord) -> ProducerResult<()>;

    /// Human-readable location of the sink
    fn location(&self) -> String;
}
