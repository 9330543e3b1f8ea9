//! Orchestrator-specific error types

use std::path::Path;
use thiserror::Error;

use producer::ProducerError;
use shared::SharedError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Missing API key: {key_name}")]
    MissingApiKey { key_name: String },

    #[error("File system operation failed: {operation} on {path}")]
    FileSystemError { operation: String, path: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("Producer error: {0}")]
    ProducerError(#[from] ProducerError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    pub fn file_system(operation: impl Into<String>, path: &Path) -> Self {
        Self::FileSystemError {
            operation: operation.into(),
            path: path.display().to_string(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
