//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Identifier for any execution unit in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// The orchestrator (singleton)
    Orchestrator,
    /// Worker task with its spawn index
    Worker(u32),
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Orchestrator => write!(f, "orchestrator"),
            ProcessId::Worker(id) => write!(f, "worker_{id}"),
        }
    }
}

/// Generative service providers available to workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    Anthropic,
    OpenAI,
    Random,
}

impl ProviderId {
    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderId::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderId::OpenAI => Some("OPENAI_API_KEY"),
            ProviderId::Random => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Anthropic => write!(f, "anthropic"),
            ProviderId::OpenAI => write!(f, "openai"),
            ProviderId::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            "openai" => Ok(ProviderId::OpenAI),
            "random" => Ok(ProviderId::Random),
            _ => Err(format!("Unknown provider: {s}")),
        }
    }
}

/// Failure reasons for generative service requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFailure {
    /// Service signalled that the caller is sending too fast (HTTP 429)
    RateLimitExceeded,
    /// Authentication rejected by the service
    AuthenticationFailed,
    /// Any other non-success status returned by the service
    ServiceError { status: u16, message: String },
    /// Connection, DNS or timeout failure before a status was received
    NetworkError(String),
    /// Response body could not be decoded
    InvalidResponse(String),
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ApiFailure::AuthenticationFailed => write!(f, "authentication failed"),
            ApiFailure::ServiceError { status, message } => write!(f, "service error {status}: {message}"),
            ApiFailure::NetworkError(message) => write!(f, "network error: {message}"),
            ApiFailure::InvalidResponse(message) => write!(f, "invalid response: {message}"),
        }
    }
}

/// Category identifier, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Category with its positive weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedCategory {
    pub category: Category,
    pub weight: u32,
}

/// Validated, ordered set of weighted categories
///
/// Declaration order is preserved and is the tie-break order used by
/// category selection. Construction guarantees at least one category,
/// unique names and weights greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWeights {
    entries: Vec<WeightedCategory>,
}

impl CategoryWeights {
    /// Build from (name, weight) pairs in declaration order
    pub fn from_pairs<I, N>(pairs: I) -> SharedResult<Self>
    where
        I: IntoIterator<Item = (N, i64)>,
        N: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (name, weight) in pairs {
            let name = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(SharedError::InvalidCategory { input: name });
            }
            if weight <= 0 {
                return Err(SharedError::invalid_config(format!("category_weights.{trimmed}"), weight));
            }
            let weight = u32::try_from(weight)
                .map_err(|_| SharedError::invalid_config(format!("category_weights.{trimmed}"), weight))?;
            if !seen.insert(trimmed.to_string()) {
                return Err(SharedError::invalid_config("category_weights", format!("duplicate category '{trimmed}'")));
            }
            entries.push(WeightedCategory {
                category: Category::new(trimmed),
                weight,
            });
        }

        if entries.is_empty() {
            return Err(SharedError::invalid_config("category_weights", "empty"));
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedCategory> {
        self.entries.iter()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter().map(|e| &e.category)
    }

    pub fn weight_of(&self, category: &Category) -> Option<u32> {
        self.entries.iter().find(|e| &e.category == category).map(|e| e.weight)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First declared category
    pub fn first(&self) -> &Category {
        // never empty by construction
        &self.entries[0].category
    }
}

/// One committed question/answer pair as persisted to the output sink
///
/// Field names are the durable line format read by downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub cost: u64,
}

impl QaRecord {
    /// Serialize as one newline-terminated JSON line
    pub fn to_json_line(&self) -> SharedResult<String> {
        let mut line = serde_json::to_string(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })?;
        line.push('\n');
        Ok(line)
    }
}
