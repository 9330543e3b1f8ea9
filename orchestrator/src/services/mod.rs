//! Service implementations
//!
//! Real implementations of the I/O-facing seams used by the orchestrator.

pub mod api_keys;
pub mod file_system;

#[cfg(test)]
mod tests;

pub use api_keys::RealApiKeySource;
pub use file_system::JsonlFileSink;
