//! Shared types for the catalog admin workspace
//!
//! Domain models exchanged between the data-access core, the HTTP API and
//! the command line, plus the unified error system.

pub mod error;
pub mod models;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
