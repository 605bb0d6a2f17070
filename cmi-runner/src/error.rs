//! Error types for the runner services
//!
//! Retry exhaustion and submission failure are separate types so callers can
//! tell them apart without inspecting messages. A FAILED import job is not an
//! error at all; it is returned as a terminal status.

use cmi_client::ClientError;
use cmi_core::domain::import_job::{InvalidJobSpec, JobHandle};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a retried inference call
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Every attempt failed
    #[error("failed to get a response after {attempts} attempt(s): {last_error}")]
    ExhaustedRetries {
        attempts: u32,
        /// Error of the final attempt
        #[source]
        last_error: ClientError,
    },
}

/// Failure while submitting or polling an import job
#[derive(Debug, Error)]
pub enum PollError {
    /// The job specification was rejected before submission
    #[error("invalid import job: {0}")]
    InvalidSpec(#[from] InvalidJobSpec),

    /// The submission call itself failed
    #[error("failed to submit import job: {0}")]
    Submission(#[source] ClientError),

    /// A status query failed
    #[error("failed to query status of job {handle}: {source}")]
    Status {
        handle: JobHandle,
        #[source]
        source: ClientError,
    },
}

/// Failure while moving model files between the hub, disk and storage
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to download {repo_id}: {source}")]
    Download {
        repo_id: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to upload {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: ClientError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while deleting a model or its storage objects
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to delete model {model_id}: {source}")]
    Model {
        model_id: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to list objects in s3://{bucket}/{prefix}: {source}")]
    List {
        bucket: String,
        prefix: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to delete objects from {bucket} after {deleted} deleted: {source}")]
    Delete {
        bucket: String,
        deleted: usize,
        #[source]
        source: ClientError,
    },
}
