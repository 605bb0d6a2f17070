//! Data Transfer Objects
//!
//! Wire representations of domain types, shaped the way the remote
//! services expect them.

pub mod inference;
