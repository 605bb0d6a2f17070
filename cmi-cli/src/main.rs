//! CMI CLI
//!
//! Command-line interface for the custom model import lifecycle: deploy a
//! hub model to Bedrock, run inference against it, and delete it again.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cmi")]
#[command(about = "Bedrock custom model import CLI", long_about = None)]
struct Cli {
    /// AWS region
    #[arg(long, env = "region_info")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cmi=info,cmi_runner=info,cmi_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let runner = cmi_runner::Config::from_env().context("Invalid runner configuration")?;
    let config = Config {
        region: cli.region,
        runner,
    };

    handle_command(cli.command, &config).await
}
