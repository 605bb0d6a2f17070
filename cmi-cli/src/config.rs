//! Configuration module
//!
//! Handles CLI configuration: AWS region selection plus the runner tunables.

use cmi_client::SdkConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region override; the default provider chain applies when unset
    pub region: Option<String>,

    /// Poll, retry, batching and cold-start tunables
    pub runner: cmi_runner::Config,
}

impl Config {
    /// Loads the shared AWS configuration for this region
    pub async fn aws(&self) -> SdkConfig {
        cmi_client::load_aws_config(self.region.as_deref()).await
    }
}
