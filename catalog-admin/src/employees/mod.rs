//! Employee registry and the deprecated field sweep

pub mod migrator;
pub mod registry;

pub use migrator::{BoundedBatchMigrator, DEPRECATED_FIELD, MigrationReport};
pub use registry::EmployeeRegistry;
