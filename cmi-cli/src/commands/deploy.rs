//! Deploy command handler
//!
//! Downloads a model snapshot, uploads it to S3, imports it and waits for
//! the import job to finish.

use anyhow::{Context, Result};
use clap::Args;
use cmi_client::{BedrockClient, HubClient, S3Store};
use cmi_core::domain::import_job::{ImportJobSpec, TerminalStatus};
use cmi_runner::{JobOutcome, JobPoller, ModelTransfer};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Deploy arguments
#[derive(Args)]
pub struct DeployArgs {
    /// Hugging Face model ID
    #[arg(long, env = "hf_model_id")]
    hf_model_id: String,

    /// Hub revision (branch, tag or commit)
    #[arg(long, env = "hf_revision", default_value = "main")]
    revision: String,

    /// S3 bucket name
    #[arg(long, env = "bucket_name")]
    bucket_name: String,

    /// S3 prefix
    #[arg(long, env = "s3_prefix")]
    s3_prefix: String,

    /// Local directory to store the downloaded model
    #[arg(long, env = "local_directory")]
    local_directory: PathBuf,

    /// Import job name (generated from the model name when omitted)
    #[arg(long, env = "job_name")]
    job_name: Option<String>,

    /// Name of the imported model
    #[arg(long, env = "imported_model_name")]
    imported_model_name: String,

    /// IAM role ARN the import job assumes
    #[arg(long, env = "role_arn")]
    role_arn: String,

    /// Do not wait for the cold start after the import completes
    #[arg(long)]
    skip_cold_start: bool,
}

/// Handle the deploy command
pub async fn handle_deploy(args: DeployArgs, config: &Config) -> Result<()> {
    let aws = config.aws().await;

    let hub = Arc::new(HubClient::from_env().with_revision(&args.revision));
    let store = Arc::new(S3Store::new(&aws));
    let transfer = ModelTransfer::new(hub, store);

    transfer
        .download(&args.hf_model_id, &args.local_directory)
        .await
        .context("Failed to download model")?;

    transfer
        .upload(&args.local_directory, &args.bucket_name, &args.s3_prefix)
        .await
        .context("Failed to upload model to S3")?;

    let job_name = args
        .job_name
        .clone()
        .unwrap_or_else(|| ImportJobSpec::generated_job_name(&args.imported_model_name));

    let spec = ImportJobSpec::new(
        job_name,
        &args.imported_model_name,
        &args.role_arn,
        ImportJobSpec::s3_source_uri(&args.bucket_name, &args.s3_prefix),
    )?;

    info!("Deploying model: {}", spec.imported_model_name);

    let poller = JobPoller::new(
        Arc::new(BedrockClient::new(&aws)),
        config.runner.poll_interval,
    );
    let outcome = poller
        .submit_and_wait(&spec)
        .await
        .context("Failed to deploy model")?;

    finish(&outcome, config.runner.cold_start_wait, args.skip_cold_start).await
}

/// Reports a finished import job
///
/// A completed model gets `cold_start_wait` to warm up before the summary is
/// printed, unless `skip_cold_start` is set. A failed job is an error.
async fn finish(
    outcome: &JobOutcome,
    cold_start_wait: Duration,
    skip_cold_start: bool,
) -> Result<()> {
    match outcome.status {
        TerminalStatus::Completed => {
            if !skip_cold_start && !cold_start_wait.is_zero() {
                info!("Waiting {:?} for cold start", cold_start_wait);
                tokio::time::sleep(cold_start_wait).await;
            }
            print_outcome(outcome);
            Ok(())
        }
        TerminalStatus::Failed => {
            print_outcome(outcome);
            anyhow::bail!("Import job {} failed", outcome.job.handle)
        }
    }
}

/// Print the result of an import job
fn print_outcome(outcome: &JobOutcome) {
    let job = &outcome.job;
    let status = match outcome.status {
        TerminalStatus::Completed => outcome.status.to_string().green(),
        TerminalStatus::Failed => outcome.status.to_string().red(),
    };

    println!();
    println!("  {} Import job {}", "▸".cyan(), job.spec.job_name.bold());
    println!("    Status:       {}", status);
    println!("    Job ARN:      {}", job.handle.as_str().dimmed());
    println!(
        "    Submitted:    {}",
        job.submitted_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!("    Polls:        {}", outcome.polls);

    match (&job.imported_model_arn, &job.failure_message) {
        (Some(arn), _) => println!("    Model ID:     {}", arn.bold()),
        (None, Some(message)) => println!("    Failure:      {}", message.red()),
        (None, None) => println!("    Model ID:     {}", "Model ID not available".yellow()),
    }
    println!();
}
