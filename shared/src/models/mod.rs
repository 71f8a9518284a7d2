//! Data models
//!
//! Shared between the catalog core, the HTTP API and the command line.
//! Field names serialize as camelCase to match the documents persisted by
//! the mobile app and the admin frontend.

pub mod employee;
pub mod product;
pub mod stats;

// Re-exports
pub use employee::*;
pub use product::*;
pub use stats::*;
