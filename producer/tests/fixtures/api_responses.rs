//! Scripted generative service fakes

#![allow(dead_code)] // Test utilities may not all be used by every test binary

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use producer::{ApiClient, TokenCounter};
use shared::ApiFailure;

pub const VALID_RESPONSE: &str = "Q: What is the boiling point of water at sea level?\nA: 100 degrees Celsius.";

/// Replays a fixed script, then repeats a fallback response forever
pub struct ScriptedApiClient {
    script: Mutex<VecDeque<Result<String, ApiFailure>>>,
    fallback: Result<String, ApiFailure>,
    latency: Duration,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedApiClient {
    pub fn new(script: Vec<Result<String, ApiFailure>>, fallback: Result<String, ApiFailure>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            latency: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with a well-formed pair
    pub fn always_valid() -> Self {
        Self::new(Vec::new(), Ok(VALID_RESPONSE.to_string()))
    }

    pub fn always(response: Result<String, ApiFailure>) -> Self {
        Self::new(Vec::new(), response)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for ScriptedApiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn provider_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Every text costs the same number of tokens
pub struct FixedTokenCounter(pub u64);

impl TokenCounter for FixedTokenCounter {
    fn count(&self, _text: &str) -> u64 {
        self.0
    }
}
