//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod delete;
mod deploy;
mod infer;

pub use delete::DeleteArgs;
pub use deploy::DeployArgs;
pub use infer::InferArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download a hub model, upload it to S3 and import it
    Deploy(DeployArgs),
    /// Run one inference request against an imported model
    Infer(InferArgs),
    /// Delete an imported model and optionally its S3 objects
    Delete(DeleteArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Deploy(args) => deploy::handle_deploy(args, config).await,
        Commands::Infer(args) => infer::handle_infer(args, config).await,
        Commands::Delete(args) => delete::handle_delete(args, config).await,
    }
}
