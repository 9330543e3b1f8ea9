//! Environment-backed API key source
//!
//! Keys are read from process environment variables. `RealApiKeySource::new`
//! first loads a `.env` file from the current directory or its parents, if
//! one exists; variables already set in the environment take precedence.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::ApiKeySource;
use shared::{process_debug, ProcessId, ProviderId};

/// Real API key source using environment variables
pub struct RealApiKeySource {
    /// Values from an explicit env file; `None` reads the process environment
    file_values: Option<HashMap<String, String>>,
}

impl RealApiKeySource {
    pub fn new() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => process_debug!(ProcessId::Orchestrator, "Loaded environment from {}", path.display()),
            Err(_) => process_debug!(ProcessId::Orchestrator, "No .env file found, using process environment"),
        }
        Self { file_values: None }
    }

    /// Read keys only from the given env file, ignoring the process environment
    pub fn from_env_file(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| OrchestratorError::config(format!("cannot read {}: {e}", path.display())))?;

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) =
                item.map_err(|e| OrchestratorError::config(format!("invalid line in {}: {e}", path.display())))?;
            values.insert(key, value);
        }

        Ok(Self {
            file_values: Some(values),
        })
    }

    fn lookup(&self, key_name: &str) -> Option<String> {
        let value = match &self.file_values {
            Some(values) => values.get(key_name).cloned(),
            None => std::env::var(key_name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

impl Default for RealApiKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiKeySource for RealApiKeySource {
    fn api_key_for(&self, provider: ProviderId) -> OrchestratorResult<Option<String>> {
        let Some(key_name) = provider.api_key_env() else {
            return Ok(None);
        };

        match self.lookup(key_name) {
            Some(value) => {
                process_debug!(ProcessId::Orchestrator, "🔑 Found {} for {}", key_name, provider);
                Ok(Some(value))
            }
            None => Err(OrchestratorError::MissingApiKey {
                key_name: key_name.to_string(),
            }),
        }
    }
}
