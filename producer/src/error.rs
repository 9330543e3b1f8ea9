//! Producer error types

use shared::SharedError;
use thiserror::Error;

/// Result type for producer operations
pub type ProducerResult<T> = Result<T, ProducerError>;

/// Producer error types
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Output sink error: {message}")]
    SinkError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl ProducerError {
    pub fn sink(message: impl Into<String>) -> Self {
        ProducerError::SinkError { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ProducerError::ConfigError { message: message.into() }
    }
}
