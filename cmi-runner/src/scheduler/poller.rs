//! Import job poller
//!
//! Submits a model import job once, then queries its status at a fixed
//! interval until it is COMPLETED or FAILED. There is no poll limit: import
//! duration is controlled by the remote service.

use cmi_client::ImportJobApi;
use cmi_core::domain::import_job::{ImportJob, ImportJobSpec, TerminalStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::PollError;

/// Terminal state of a polling session
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: TerminalStatus,
    /// The job as of the final poll, including the imported model ARN
    pub job: ImportJob,
    /// Number of status queries made
    pub polls: u32,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == TerminalStatus::Completed
    }

    pub fn imported_model_arn(&self) -> Option<&str> {
        self.job.imported_model_arn.as_deref()
    }
}

/// Submits import jobs and waits for them to finish
pub struct JobPoller {
    api: Arc<dyn ImportJobApi>,
    poll_interval: Duration,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(api: Arc<dyn ImportJobApi>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Submits a job and polls it to a terminal status
    ///
    /// A FAILED job is a normal outcome and is returned, not raised. Only a
    /// rejected submission or a failed status query produce an error.
    pub async fn submit_and_wait(&self, spec: &ImportJobSpec) -> Result<JobOutcome, PollError> {
        spec.validate()?;

        info!(
            "Submitting import job {} for model {}",
            spec.job_name, spec.imported_model_name
        );

        let handle = self.api.submit(spec).await.map_err(|e| {
            error!("Failed to submit import job {}: {}", spec.job_name, e);
            PollError::Submission(e)
        })?;

        info!("Import job created: {}", handle);

        let mut job = ImportJob::submitted(handle, spec.clone());
        let mut polls = 0u32;

        loop {
            let snapshot = self.api.status(&job.handle).await.map_err(|e| {
                error!("Failed to query status of job {}: {}", job.handle, e);
                PollError::Status {
                    handle: job.handle.clone(),
                    source: e,
                }
            })?;
            polls += 1;
            job.apply(snapshot);

            info!(
                "Job {} status: {} (poll {}, {}s elapsed)",
                job.handle,
                job.status,
                polls,
                job.elapsed().num_seconds()
            );

            if let Some(status) = job.status.terminal() {
                match status {
                    TerminalStatus::Completed => info!("Import job {} completed", job.handle),
                    TerminalStatus::Failed => error!(
                        "Import job {} failed: {}",
                        job.handle,
                        job.failure_message.as_deref().unwrap_or("no failure message")
                    ),
                }
                return Ok(JobOutcome { status, job, polls });
            }

            debug!("Next status query in {:?}", self.poll_interval);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
