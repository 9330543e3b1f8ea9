//! Shared error types for the QA generation system

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Invalid category spec: {input}")]
    InvalidCategory { input: String },

    #[error("Budget commit task failed: {0}")]
    CommitTask(#[from] tokio::task::JoinError),
}

impl SharedError {
    pub fn invalid_config(field: impl Into<String>, value: impl ToString) -> Self {
        SharedError::InvalidConfig {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
