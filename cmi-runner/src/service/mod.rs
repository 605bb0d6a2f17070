//! Service layer
//!
//! Services hold the lifecycle logic: retrying inference calls, moving model
//! files, and deleting models with their storage. Remote access goes through
//! the `cmi-client` traits so each service can be tested in isolation.

mod cleanup;
mod invoker;
mod transfer;

pub use cleanup::ModelCleanup;
pub use invoker::{RetryPolicy, RetryingInvoker};
pub use transfer::{ModelTransfer, UploadSummary};
