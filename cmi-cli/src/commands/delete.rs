//! Delete command handler
//!
//! Deletes an imported model, then the S3 objects it was imported from when
//! both bucket and prefix are given.

use anyhow::{Context, Result};
use clap::Args;
use cmi_client::{BedrockClient, S3Store};
use cmi_runner::ModelCleanup;
use colored::*;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Delete arguments
#[derive(Args)]
pub struct DeleteArgs {
    /// Imported model ID (the model ARN)
    #[arg(long)]
    model_id: String,

    /// S3 bucket name
    #[arg(long, env = "bucket_name")]
    bucket_name: Option<String>,

    /// S3 prefix
    #[arg(long, env = "s3_prefix")]
    s3_prefix: Option<String>,
}

/// Handle the delete command
pub async fn handle_delete(args: DeleteArgs, config: &Config) -> Result<()> {
    let aws = config.aws().await;
    let cleanup = ModelCleanup::new(
        Arc::new(BedrockClient::new(&aws)),
        Arc::new(S3Store::new(&aws)),
        config.runner.delete_batch_size,
    );

    cleanup
        .delete_model(&args.model_id)
        .await
        .context("Failed to delete model")?;
    println!("{} Deleted model {}", "✓".green(), args.model_id.bold());

    match (&args.bucket_name, &args.s3_prefix) {
        (Some(bucket), Some(prefix)) => {
            let deleted = cleanup
                .delete_objects(bucket, prefix)
                .await
                .context("Failed to delete objects from S3")?;
            println!(
                "{} Deleted {} object(s) from s3://{}/{}",
                "✓".green(),
                deleted,
                bucket,
                prefix
            );
        }
        _ => info!("No bucket and prefix given, leaving S3 objects in place"),
    }

    Ok(())
}
