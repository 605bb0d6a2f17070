//! CMI Core
//!
//! Core types for the custom model import lifecycle.
//!
//! This crate contains:
//! - Domain types: inference requests/results and import jobs
//! - DTOs: wire bodies exchanged with the inference runtime

pub mod domain;
pub mod dto;
