//! Shared core types and the error taxonomy.

pub mod core;
pub mod error;
