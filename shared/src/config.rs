//! Run configuration
//!
//! A `RunConfig` is built once at startup, validated, and then shared
//! read-only with every worker.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{SharedError, SharedResult};
use crate::types::CategoryWeights;

pub const DEFAULT_OUTPUT_FILE: &str = "openllm_qa_claude35.jsonl";
pub const DEFAULT_WORKER_COUNT: u32 = 5;
pub const DEFAULT_TOKEN_CEILING: u64 = 40_000_000;

/// Category weights used when none are supplied
pub const DEFAULT_CATEGORY_WEIGHTS: &[(&str, i64)] = &[
    ("Common Sense", 3),
    ("World Understanding", 3),
    ("Math", 2),
    ("Science", 2),
    ("Medicine", 2),
    ("Coding", 2),
    ("Genetics", 1),
    ("Technology", 1),
];

/// Parameters for each generative service request
#[derive(Clone, Debug, Serialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20240620".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Complete configuration for one generation run
#[derive(Clone, Debug, Serialize)]
pub struct RunConfig {
    /// Where records are appended
    pub output_path: PathBuf,
    pub worker_count: u32,
    /// Global token budget shared by all workers
    pub token_ceiling: u64,
    pub categories: CategoryWeights,
    pub generation: GenerationConfig,
    /// Length of one backoff time unit
    pub retry_unit: Duration,
    /// How long to wait for workers after a stop request before aborting them
    pub shutdown_grace: Duration,
    pub progress_interval: Duration,
}

impl RunConfig {
    pub fn new(output_path: impl Into<PathBuf>, worker_count: u32, token_ceiling: u64, categories: CategoryWeights) -> Self {
        Self {
            output_path: output_path.into(),
            worker_count,
            token_ceiling,
            categories,
            generation: GenerationConfig::default(),
            retry_unit: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(30),
            progress_interval: Duration::from_secs(30),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_retry_unit(mut self, unit: Duration) -> Self {
        self.retry_unit = unit;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Fail fast on anything that must not reach a worker
    pub fn validate(&self) -> SharedResult<()> {
        if self.worker_count == 0 {
            return Err(SharedError::invalid_config("worker_count", self.worker_count));
        }
        if self.token_ceiling == 0 {
            return Err(SharedError::invalid_config("token_ceiling", self.token_ceiling));
        }
        if self.categories.is_empty() {
            return Err(SharedError::invalid_config("category_weights", "empty"));
        }
        if self.categories.iter().any(|c| c.weight == 0) {
            return Err(SharedError::invalid_config("category_weights", "zero weight"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(SharedError::invalid_config("output_path", "<empty>"));
        }
        if self.progress_interval.is_zero() {
            return Err(SharedError::invalid_config("progress_interval", "0s"));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        let categories = CategoryWeights::from_pairs(DEFAULT_CATEGORY_WEIGHTS.iter().copied())
            .expect("default category weights are valid");
        Self::new(DEFAULT_OUTPUT_FILE, DEFAULT_WORKER_COUNT, DEFAULT_TOKEN_CEILING, categories)
    }
}

/// Parse a `NAME=WEIGHT` category spec
pub fn parse_category_spec(input: &str) -> SharedResult<(String, i64)> {
    let (name, weight) = input
        .rsplit_once('=')
        .ok_or_else(|| SharedError::InvalidCategory { input: input.to_string() })?;
    let weight = weight
        .trim()
        .parse::<i64>()
        .map_err(|_| SharedError::InvalidCategory { input: input.to_string() })?;
    Ok((name.trim().to_string(), weight))
}
