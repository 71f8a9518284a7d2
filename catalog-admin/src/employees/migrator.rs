//! Deprecated field sweep
//!
//! Employee documents written by the retired schema may still carry `email`.
//! Every registry read schedules its removal, chunked below the batch ceiling.
//! Chunks commit independently; a document that lost the field is never
//! selected again, so a partial sweep finishes on a later read.

use doc_store::{Document, DocumentStore, WriteOp};
use serde::Serialize;

use crate::batch::{BoundedBatchExecutor, ChunkPolicy};

/// Field left over from the retired employee schema
pub const DEPRECATED_FIELD: &str = "email";

/// Default chunk size, well below the 500-operation ceiling
pub const DEFAULT_CHUNK_SIZE: usize = 400;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Documents inspected
    pub scanned: usize,
    /// Documents that still carried the deprecated field
    pub scheduled: usize,
    /// Documents cleared by this sweep
    pub cleared: usize,
    /// Some chunk failed; the rest is retried on the next read
    pub partial: bool,
}

pub struct BoundedBatchMigrator<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    chunk_size: usize,
}

impl<'a, S: DocumentStore + ?Sized> BoundedBatchMigrator<'a, S> {
    pub fn new(store: &'a S, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }

    /// Field removals for every document still carrying the deprecated field
    pub fn plan(docs: &[Document]) -> Vec<WriteOp> {
        docs.iter()
            .filter(|d| d.has_field(DEPRECATED_FIELD))
            .map(|d| WriteOp::remove_fields(d.path.clone(), vec![DEPRECATED_FIELD.to_string()]))
            .collect()
    }

    /// Best effort: failures are reported, never returned
    pub async fn sweep(&self, docs: &[Document]) -> MigrationReport {
        let ops = Self::plan(docs);
        let mut report = MigrationReport {
            scanned: docs.len(),
            scheduled: ops.len(),
            ..Default::default()
        };
        if ops.is_empty() {
            return report;
        }

        let executor =
            BoundedBatchExecutor::new(self.store, self.chunk_size, ChunkPolicy::ContinueOnFailure);
        let batch = executor.run(ops).await;
        report.cleared = batch.committed_ops;
        report.partial = !batch.failures.is_empty();

        if report.partial {
            tracing::warn!(
                scheduled = report.scheduled,
                cleared = report.cleared,
                failed_chunks = batch.failures.len(),
                "Employee field migration incomplete, will retry on next read"
            );
        } else {
            tracing::info!(cleared = report.cleared, "Removed deprecated employee field");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::{DocPath, MemoryStore};
    use serde_json::json;

    fn seed(store: &MemoryStore, n: usize, with_email: bool) -> Vec<Document> {
        (0..n)
            .map(|i| {
                let path = DocPath::parse(&format!("staff/e{}", i)).unwrap();
                let mut fields = json!({ "name": format!("E{}", i) }).as_object().cloned().unwrap();
                if with_email {
                    fields.insert(DEPRECATED_FIELD.into(), json!("x@y.z"));
                }
                store.insert(path.clone(), fields.clone());
                Document::new(path, fields)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_sweep_clears_field() {
        let store = MemoryStore::new();
        let docs = seed(&store, 3, true);

        let report = BoundedBatchMigrator::new(&store, DEFAULT_CHUNK_SIZE).sweep(&docs).await;

        assert_eq!(report, MigrationReport { scanned: 3, scheduled: 3, cleared: 3, partial: false });
        assert!(store.paths().iter().all(|p| !store.fields(p).unwrap().contains_key(DEPRECATED_FIELD)));
    }

    #[tokio::test]
    async fn test_clean_documents_send_nothing() {
        let store = MemoryStore::new();
        let docs = seed(&store, 3, false);
        let report = BoundedBatchMigrator::new(&store, DEFAULT_CHUNK_SIZE).sweep(&docs).await;
        assert_eq!(report.scheduled, 0);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_sweep_keeps_committed_chunks() {
        let store = MemoryStore::with_max_batch_ops(3);
        let docs = seed(&store, 5, true);
        store.fail_commits_after(1);

        let report = BoundedBatchMigrator::new(&store, DEFAULT_CHUNK_SIZE).sweep(&docs).await;

        assert!(report.partial);
        assert_eq!(report.cleared, 2);
        let remaining = store
            .paths()
            .iter()
            .filter(|p| store.fields(p).unwrap().contains_key(DEPRECATED_FIELD))
            .count();
        assert_eq!(remaining, 3);
    }
}
