//! Infer command handler
//!
//! Runs one generation request against an imported model with bounded
//! fixed-delay retries and prints the response with its token accounting.

use anyhow::{Context, Result};
use clap::Args;
use cmi_client::BedrockRuntimeClient;
use cmi_core::domain::inference::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, InferenceRequest, InferenceResult,
};
use cmi_runner::{RetryPolicy, RetryingInvoker};
use colored::*;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

const DEFAULT_PROMPT: &str = "Natalia sold clips to 48 of her friends in April, and then she sold half as many clips in May. \
How many clips did Natalia sell altogether in April and May?";

/// Infer arguments
#[derive(Args)]
pub struct InferArgs {
    /// Imported model ID (the model ARN)
    #[arg(long)]
    model_id: String,

    /// Prompt for the model
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Controls randomness in generation (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Maximum number of tokens to generate
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Nucleus sampling parameter (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_TOP_P)]
    top_p: f32,

    /// Maximum number of attempts [default: CMI_MAX_ATTEMPTS or 10]
    #[arg(long)]
    max_retries: Option<NonZeroU32>,

    /// Seconds to wait between attempts [default: CMI_RETRY_DELAY or 30]
    #[arg(long)]
    retry_delay: Option<u64>,
}

impl InferArgs {
    fn retry_policy(&self, config: &Config) -> Result<RetryPolicy> {
        let defaults = config.runner.retry_policy()?;
        Ok(RetryPolicy::new(
            self.max_retries.unwrap_or(defaults.max_attempts()),
            self.retry_delay
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay()),
        ))
    }
}

/// Handle the infer command
pub async fn handle_infer(args: InferArgs, config: &Config) -> Result<()> {
    let request = InferenceRequest::with_params(
        &args.prompt,
        args.temperature,
        args.max_tokens,
        args.top_p,
    )?;
    let policy = args.retry_policy(config)?;

    let aws = config.aws().await;
    let invoker = RetryingInvoker::new(
        Arc::new(BedrockRuntimeClient::new(&aws)),
        &args.model_id,
    );

    let result = invoker
        .invoke(&request, policy)
        .await
        .context("Inference failed")?;

    print_result(&result);

    Ok(())
}

/// Print the generated text and token accounting
fn print_result(result: &InferenceResult) {
    let count = |value: Option<u64>| match value {
        Some(v) => v.to_string().normal(),
        None => "n/a".dimmed(),
    };

    println!();
    println!("{}", "Generated text:".bold());
    match result.generation() {
        Some(text) => println!("{}", text.trim()),
        None => println!("{}", result.body),
    }
    println!();
    println!("  Generation token count: {}", count(result.generation_token_count()));
    println!("  Prompt token count:     {}", count(result.prompt_token_count()));
    println!("  Input token count:      {}", count(result.input_token_count()));
    println!("  Output token count:     {}", count(result.output_token_count()));
    println!(
        "  Invocation latency:     {}",
        match result.invocation_latency_ms() {
            Some(ms) => format!("{} ms", ms).normal(),
            None => "n/a".dimmed(),
        }
    );
    println!();
}
