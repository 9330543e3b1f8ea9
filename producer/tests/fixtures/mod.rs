//! Test fixtures and utilities

pub mod api_responses;
pub mod sinks;

#[allow(unused_imports)]
pub use api_responses::*;
#[allow(unused_imports)]
pub use sinks::*;
