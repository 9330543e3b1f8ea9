//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the orchestrator test suites.

#![allow(dead_code)] // Not every suite uses every helper

pub mod fixtures;
pub mod helpers;

pub use fixtures::{FixedTokenCounter, HangingClient, SlowSink, StubClient, TestFixtures};
pub use helpers::{OrchestratorBuilder, TestHelpers};
