//! Orchestrator trait definitions for dependency injection

use shared::ProviderId;

use crate::error::OrchestratorResult;

/// Source of provider credentials
///
/// Keeps environment access out of the run logic so tests can inject keys.
#[mockall::automock]
pub trait ApiKeySource: Send + Sync {
    /// Key for a provider; `Ok(None)` for providers that need no key,
    /// `MissingApiKey` when a networked provider has none configured
    fn api_key_for(&self, provider: ProviderId) -> OrchestratorResult<Option<String>>;
}
