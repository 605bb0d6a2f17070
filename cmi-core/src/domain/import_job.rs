//! Import job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejected import job parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} cannot be empty")]
pub struct InvalidJobSpec(pub &'static str);

/// Parameters for creating a model import job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJobSpec {
    pub job_name: String,
    pub imported_model_name: String,
    /// IAM role the service assumes to read the model data
    pub role_arn: String,
    /// Location of the model data, e.g. `s3://bucket/prefix/`
    pub source_uri: String,
}

impl ImportJobSpec {
    pub fn new(
        job_name: impl Into<String>,
        imported_model_name: impl Into<String>,
        role_arn: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Result<Self, InvalidJobSpec> {
        let spec = Self {
            job_name: job_name.into(),
            imported_model_name: imported_model_name.into(),
            role_arn: role_arn.into(),
            source_uri: source_uri.into(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), InvalidJobSpec> {
        if self.job_name.is_empty() {
            return Err(InvalidJobSpec("job_name"));
        }
        if self.imported_model_name.is_empty() {
            return Err(InvalidJobSpec("imported_model_name"));
        }
        if self.role_arn.is_empty() {
            return Err(InvalidJobSpec("role_arn"));
        }
        if self.source_uri.is_empty() {
            return Err(InvalidJobSpec("source_uri"));
        }
        Ok(())
    }

    /// Builds the `s3://bucket/prefix/` URI the import job reads from
    pub fn s3_source_uri(bucket: &str, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("s3://{}/", bucket)
        } else {
            format!("s3://{}/{}/", bucket, prefix)
        }
    }

    /// Generates a job name for an imported model, e.g. `llama-import-1a2b3c4d`
    pub fn generated_job_name(imported_model_name: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-import-{}", imported_model_name, &suffix[..8])
    }
}

/// Opaque reference to a submitted job (the job ARN)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Import job status as reported by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
}

/// Status after which no further polling occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    Completed,
    Failed,
}

impl JobStatus {
    /// Parses a remote status string, ignoring case
    ///
    /// Anything that is not recognised is non-terminal and maps to `Running`.
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "SUBMITTED" => Self::Submitted,
            _ => Self::Running,
        }
    }

    pub fn terminal(self) -> Option<TerminalStatus> {
        match self {
            Self::Completed => Some(TerminalStatus::Completed),
            Self::Failed => Some(TerminalStatus::Failed),
            Self::Submitted | Self::Running => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.terminal().is_some()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

impl From<TerminalStatus> for JobStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => Self::Completed,
            TerminalStatus::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        JobStatus::from(*self).fmt(f)
    }
}

/// One status query response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Set once the job completed
    pub imported_model_arn: Option<String>,
    pub failure_message: Option<String>,
}

impl JobSnapshot {
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            imported_model_arn: None,
            failure_message: None,
        }
    }
}

/// A submitted import job
///
/// Owned by one polling session; status only changes through [`ImportJob::apply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub handle: JobHandle,
    pub spec: ImportJobSpec,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub imported_model_arn: Option<String>,
    pub failure_message: Option<String>,
}

impl ImportJob {
    pub fn submitted(handle: JobHandle, spec: ImportJobSpec) -> Self {
        Self {
            handle,
            spec,
            status: JobStatus::Submitted,
            submitted_at: Utc::now(),
            imported_model_arn: None,
            failure_message: None,
        }
    }

    /// Records a polled snapshot
    pub fn apply(&mut self, snapshot: JobSnapshot) {
        self.status = snapshot.status;
        if snapshot.imported_model_arn.is_some() {
            self.imported_model_arn = snapshot.imported_model_arn;
        }
        if snapshot.failure_message.is_some() {
            self.failure_message = snapshot.failure_message;
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ImportJobSpec {
        ImportJobSpec::new(
            "job",
            "model",
            "arn:aws:iam::123456789012:role/import",
            "s3://bucket/prefix/",
        )
        .unwrap()
    }

    #[test]
    fn test_status_from_remote() {
        assert_eq!(JobStatus::from_remote("Completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_remote("FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::from_remote("InProgress"), JobStatus::Running);
        assert_eq!(JobStatus::from_remote("submitted"), JobStatus::Submitted);
        assert_eq!(JobStatus::from_remote("Stopping"), JobStatus::Running);
    }

    #[test]
    fn test_terminal_statuses() {
        assert_eq!(JobStatus::Completed.terminal(), Some(TerminalStatus::Completed));
        assert_eq!(JobStatus::Failed.terminal(), Some(TerminalStatus::Failed));
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Submitted.is_terminal());
    }

    #[test]
    fn test_s3_source_uri() {
        assert_eq!(
            ImportJobSpec::s3_source_uri("bucket", "models/llama"),
            "s3://bucket/models/llama/"
        );
        assert_eq!(
            ImportJobSpec::s3_source_uri("bucket", "/models/llama/"),
            "s3://bucket/models/llama/"
        );
        assert_eq!(ImportJobSpec::s3_source_uri("bucket", ""), "s3://bucket/");
    }

    #[test]
    fn test_spec_validation() {
        assert_eq!(
            ImportJobSpec::new("", "model", "role", "s3://b/").unwrap_err(),
            InvalidJobSpec("job_name")
        );
        assert_eq!(
            ImportJobSpec::new("job", "model", "", "s3://b/").unwrap_err(),
            InvalidJobSpec("role_arn")
        );
    }

    #[test]
    fn test_generated_job_name() {
        let name = ImportJobSpec::generated_job_name("llama");
        assert!(name.starts_with("llama-import-"));
        assert_eq!(name.len(), "llama-import-".len() + 8);
    }

    #[test]
    fn test_apply_keeps_model_arn() {
        let mut job = ImportJob::submitted(JobHandle::new("arn:job"), spec());
        job.apply(JobSnapshot {
            status: JobStatus::Completed,
            imported_model_arn: Some("arn:model".to_string()),
            failure_message: None,
        });
        job.apply(JobSnapshot::with_status(JobStatus::Completed));

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.imported_model_arn.as_deref(), Some("arn:model"));
    }
}
