//! CMI Runner
//!
//! Orchestration layer for the model lifecycle.
//!
//! Architecture:
//! - Configuration: tunables loaded from environment or defaults
//! - Services: retrying inference, model transfer and cleanup
//! - Scheduler: import job submission and status polling
//!
//! Every service is built over the client traits of `cmi-client`, so the
//! retry and polling logic runs unchanged against in-memory doubles.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{CleanupError, InvokeError, PollError, TransferError};
pub use scheduler::{JobOutcome, JobPoller};
pub use service::{ModelCleanup, ModelTransfer, RetryPolicy, RetryingInvoker, UploadSummary};
