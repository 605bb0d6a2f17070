//! Bedrock control-plane client
//!
//! Handles model import jobs and imported model lifecycle:
//! - Submitting import jobs
//! - Querying import job status
//! - Deleting imported models

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrock::Client;
use aws_sdk_bedrock::types::{ModelDataSource, S3DataSource};
use cmi_core::domain::import_job::{ImportJobSpec, JobHandle, JobSnapshot, JobStatus};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Remote job-submission and status API
#[async_trait]
pub trait ImportJobApi: Send + Sync {
    /// Submits a model import job
    ///
    /// # Returns
    /// The handle used for subsequent status queries
    async fn submit(&self, spec: &ImportJobSpec) -> Result<JobHandle>;

    /// Queries the current status of a job
    async fn status(&self, handle: &JobHandle) -> Result<JobSnapshot>;
}

/// Imported model management
#[async_trait]
pub trait ImportedModelApi: Send + Sync {
    /// Deletes an imported model
    ///
    /// # Arguments
    /// * `model_id` - Model name or ARN
    async fn delete_imported_model(&self, model_id: &str) -> Result<()>;
}

/// Bedrock implementation of [`ImportJobApi`] and [`ImportedModelApi`]
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: Client,
}

impl BedrockClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImportJobApi for BedrockClient {
    async fn submit(&self, spec: &ImportJobSpec) -> Result<JobHandle> {
        let source = S3DataSource::builder()
            .s3_uri(&spec.source_uri)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let output = self
            .client
            .create_model_import_job()
            .job_name(&spec.job_name)
            .imported_model_name(&spec.imported_model_name)
            .role_arn(&spec.role_arn)
            .model_data_source(ModelDataSource::S3DataSource(source))
            .send()
            .await
            .map_err(|e| ClientError::aws("CreateModelImportJob", e))?;

        Ok(JobHandle::new(output.job_arn()))
    }

    async fn status(&self, handle: &JobHandle) -> Result<JobSnapshot> {
        let output = self
            .client
            .get_model_import_job()
            .job_identifier(handle.as_str())
            .send()
            .await
            .map_err(|e| ClientError::aws("GetModelImportJob", e))?;

        let raw_status = output.status().map(|s| s.as_str()).unwrap_or_default();
        debug!("Job {} reported status {:?}", handle, raw_status);

        Ok(JobSnapshot {
            status: JobStatus::from_remote(raw_status),
            imported_model_arn: output.imported_model_arn().map(str::to_string),
            failure_message: output.failure_message().map(str::to_string),
        })
    }
}

#[async_trait]
impl ImportedModelApi for BedrockClient {
    async fn delete_imported_model(&self, model_id: &str) -> Result<()> {
        self.client
            .delete_imported_model()
            .model_identifier(model_id)
            .send()
            .await
            .map_err(|e| ClientError::aws("DeleteImportedModel", e))?;

        Ok(())
    }
}
