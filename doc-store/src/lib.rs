//! Document Store - client boundary for the remote schemaless document store
//!
//! Provides the [`DocumentStore`] trait the catalog core is written against,
//! a network implementation speaking the Firestore REST protocol
//! ([`RestStore`]) and an in-process implementation for tests and local
//! runs ([`MemoryStore`]).

pub mod config;
pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod rest;
pub mod store;

pub use config::StoreConfig;
pub use document::{Document, Fields, WriteBatch, WriteOp};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocPath};
pub use rest::RestStore;
pub use store::DocumentStore;

/// Per-commit operation ceiling of the reference store
pub const DEFAULT_MAX_BATCH_OPS: usize = 500;
