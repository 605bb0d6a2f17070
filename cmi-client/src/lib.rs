//! CMI Clients
//!
//! Type-safe clients for the remote services the model lifecycle touches:
//! - Bedrock control plane (import jobs, imported models)
//! - Bedrock runtime (model invocation)
//! - S3 (model artifacts)
//! - Hugging Face Hub (model snapshots)
//!
//! Every service sits behind a trait so the runner services can be
//! exercised against in-memory doubles.
//!
//! # Example
//!
//! ```no_run
//! use cmi_client::{BedrockRuntimeClient, InferenceApi, load_aws_config};
//! use cmi_core::domain::inference::InferenceRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_aws_config(Some("us-east-1")).await;
//!     let runtime = BedrockRuntimeClient::new(&config);
//!
//!     let request = InferenceRequest::new("What is 6 x 7?")?;
//!     let result = runtime.invoke_model("arn:aws:bedrock:...", &request).await?;
//!
//!     println!("{:?}", result.generation());
//!     Ok(())
//! }
//! ```

mod bedrock;
pub mod error;
mod hub;
mod runtime;
mod storage;

pub use bedrock::{BedrockClient, ImportJobApi, ImportedModelApi};
pub use error::{ClientError, Result};
pub use hub::{HubClient, ModelHub};
pub use runtime::{BedrockRuntimeClient, InferenceApi};
pub use storage::{ObjectStore, S3Store};

pub use aws_config::SdkConfig;

use aws_config::{BehaviorVersion, Region};

/// Loads shared AWS configuration from the default provider chain
///
/// # Arguments
/// * `region` - Region override; falls back to the provider chain when `None`
pub async fn load_aws_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
