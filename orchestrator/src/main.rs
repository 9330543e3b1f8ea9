//! Main entry point for the orchestrator binary
//!
//! Wires the real services (HTTP client, word-based token counter, JSONL
//! file sink) into an [`Orchestrator`] and runs it until the budget is
//! spent or Ctrl+C is pressed.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;

use orchestrator::{
    services::{JsonlFileSink, RealApiKeySource},
    signals, ApiKeySource, Orchestrator, OrchestratorError, OrchestratorResult,
};
use producer::{RealApiClient, WordTokenCounter};
use shared::config::{parse_category_spec, DEFAULT_CATEGORY_WEIGHTS, DEFAULT_OUTPUT_FILE};
use shared::{logging, process_debug, CategoryWeights, GenerationConfig, ProcessId, ProviderId, RunConfig};

/// Generates a weighted question/answer dataset under a global token budget
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Runs concurrent workers that generate a JSONL question/answer dataset")]
pub struct Args {
    /// Output file (JSON Lines, appended to if it exists)
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Number of concurrent workers
    #[arg(long, default_value = "5")]
    pub workers: u32,

    /// Global token budget for the whole run
    #[arg(long, default_value = "40000000")]
    pub max_tokens: u64,

    /// Category weight as NAME=WEIGHT; repeat for each category (replaces the defaults)
    #[arg(long = "category", value_name = "NAME=WEIGHT")]
    pub categories: Vec<String>,

    /// Generative service provider (anthropic, openai, random)
    #[arg(long, default_value = "anthropic")]
    pub provider: ProviderId,

    /// Model name sent to the provider
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum tokens per service response
    #[arg(long, default_value = "1024")]
    pub max_response_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value = "0.7")]
    pub temperature: f32,

    /// Length of one backoff time unit in milliseconds
    #[arg(long, default_value = "1000")]
    pub retry_unit_ms: u64,

    /// Seconds to wait for workers after Ctrl+C before aborting them
    #[arg(long, default_value = "30")]
    pub shutdown_grace_secs: u64,

    /// Seconds between progress reports
    #[arg(long, default_value = "30")]
    pub progress_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    fn category_weights(&self) -> OrchestratorResult<CategoryWeights> {
        if self.categories.is_empty() {
            return Ok(CategoryWeights::from_pairs(DEFAULT_CATEGORY_WEIGHTS.iter().copied())?);
        }

        let pairs = self
            .categories
            .iter()
            .map(|spec| parse_category_spec(spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CategoryWeights::from_pairs(pairs)?)
    }

    fn run_config(&self) -> OrchestratorResult<RunConfig> {
        let mut generation = GenerationConfig {
            max_tokens: self.max_response_tokens,
            temperature: self.temperature,
            ..GenerationConfig::default()
        };
        if let Some(model) = &self.model {
            generation.model = model.clone();
        }

        let config = RunConfig::new(&self.output, self.workers, self.max_tokens, self.category_weights()?)
            .with_generation(generation)
            .with_retry_unit(Duration::from_millis(self.retry_unit_ms))
            .with_shutdown_grace(Duration::from_secs(self.shutdown_grace_secs))
            .with_progress_interval(Duration::from_secs(self.progress_secs));
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let id = ProcessId::Orchestrator;

    // Everything that can be rejected is checked before the output file is touched
    let config = args.run_config()?;
    let api_key = RealApiKeySource::new().api_key_for(args.provider)?;
    let api_client = RealApiClient::new(args.provider, api_key, config.generation.clone())?;
    process_debug!(
        id,
        provider = %api_client.provider(),
        model = %config.generation.model,
        output = %config.output_path.display(),
        "Configuration loaded"
    );

    let sink = JsonlFileSink::new(&config.output_path);
    let mut orchestrator = Orchestrator::new(config, api_client, WordTokenCounter::new(), sink)?;

    // First Ctrl+C stops gracefully, the second exits at once
    let shutdown_sender = orchestrator.get_shutdown_sender();
    tokio::spawn(async move {
        match signals::watch_interrupts(signal::ctrl_c, shutdown_sender).await {
            Ok(()) => std::process::exit(signals::FORCED_EXIT_CODE),
            Err(err) => logging::log_failure(&ProcessId::Orchestrator, "Signal handling", &err),
        }
    });

    let summary = orchestrator.run().await?;
    println!("{summary}");
    process_debug!(id, "Run summary: {}", serde_json::to_string(&summary)?);

    if summary.workers.iter().any(|r| matches!(r.stop_reason, producer::StopReason::SinkFailed(_))) {
        return Err(OrchestratorError::file_system("append", Path::new(&summary.output_location)));
    }
    Ok(())
}
