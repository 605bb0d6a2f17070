//! Scheduler layer for the runner
//!
//! This layer submits model import jobs and follows them until the control
//! plane reports a terminal status.

pub mod poller;

pub use poller::{JobOutcome, JobPoller};
