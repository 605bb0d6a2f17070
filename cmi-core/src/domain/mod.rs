//! Core domain types
//!
//! These types are shared between the remote clients (which produce them)
//! and the runner services (which drive retries and polling over them).

pub mod import_job;
pub mod inference;
