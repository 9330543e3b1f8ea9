//! Generative service clients
//!
//! One client type covers every provider; the provider decides which HTTP
//! endpoint (or the offline random generator) serves a request.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::error::{ProducerError, ProducerResult};
use crate::traits::ApiClient;
use shared::{ApiFailure, GenerationConfig, ProviderId};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Share of random responses deliberately missing the Q/A markers
const RANDOM_MALFORMED_RATE: f64 = 0.05;

/// Real API client for all supported providers
pub struct RealApiClient {
    provider: ProviderId,
    api_key: Option<String>,
    base_url: String,
    config: GenerationConfig,
    http: reqwest::Client,
}

impl RealApiClient {
    /// Create a client; networked providers require an API key
    pub fn new(provider: ProviderId, api_key: Option<String>, config: GenerationConfig) -> ProducerResult<Self> {
        if provider.api_key_env().is_some() && api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ProducerError::config(format!(
                "{} requires {}",
                provider,
                provider.api_key_env().unwrap_or("an API key")
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProducerError::config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = match provider {
            ProviderId::Anthropic => ANTHROPIC_BASE_URL,
            ProviderId::OpenAI => OPENAI_BASE_URL,
            ProviderId::Random => "",
        };

        Ok(Self {
            provider,
            api_key,
            base_url: base_url.to_string(),
            config,
            http,
        })
    }

    /// Offline client that needs no key
    pub fn random(config: GenerationConfig) -> ProducerResult<Self> {
        Self::new(ProviderId::Random, None, config)
    }

    /// Point the client at a different host (used against mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Map a non-success HTTP status onto a failure kind
    fn classify_status(status: u16, body: &str) -> ApiFailure {
        match status {
            429 => ApiFailure::RateLimitExceeded,
            401 | 403 => ApiFailure::AuthenticationFailed,
            _ => ApiFailure::ServiceError {
                status,
                message: body.chars().take(200).collect(),
            },
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value, ApiFailure> {
        let response = request.send().await.map_err(|e| ApiFailure::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiFailure::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    async fn make_anthropic_request(&self, prompt: &str) -> Result<String, ApiFailure> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let request = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response_json = self.send_json(request).await?;

        response_json
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|item| item.get("text"))
            .and_then(|text| text.as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiFailure::InvalidResponse("No content in response".to_string()))
    }

    async fn make_openai_request(&self, prompt: &str) -> Result<String, ApiFailure> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });

        let request = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response_json = self.send_json(request).await?;

        response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiFailure::InvalidResponse("No content in response".to_string()))
    }

    async fn make_random_request(&self, prompt: &str) -> Result<String, ApiFailure> {
        let topic = extract_topic(prompt).unwrap_or("general knowledge").to_string();

        let (latency_ms, serial, malformed) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(5..25u64),
                rng.gen_range(1000..10_000u32),
                rng.gen_bool(RANDOM_MALFORMED_RATE),
            )
        };
        tokio::time::sleep(Duration::from_millis(latency_ms)).await;

        if malformed {
            return Ok(format!("I would love to talk about {topic}, but I lost the format."));
        }

        Ok(format!(
            "Q: What is one surprising fact about {topic} (sample {serial})?\n\
             A: Sample {serial} notes that {topic} has more depth than most people expect, \
             and exploring it rewards curiosity."
        ))
    }
}

#[async_trait]
impl ApiClient for RealApiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiFailure> {
        match self.provider {
            ProviderId::Anthropic => self.make_anthropic_request(prompt).await,
            ProviderId::OpenAI => self.make_openai_request(prompt).await,
            ProviderId::Random => self.make_random_request(prompt).await,
        }
    }

    fn provider_name(&self) -> String {
        self.provider.to_string()
    }
}

/// Topic between the first pair of `**` in a prompt
fn extract_topic(prompt: &str) -> Option<&str> {
    let start = prompt.find("**")? + 2;
    let len = prompt[start..].find("**")?;
    Some(&prompt[start..start + len])
}
