//! Bounded batch executor
//!
//! Commits an arbitrary number of writes as a sequence of atomic chunks, each
//! strictly below the store's per-batch ceiling. The sequence as a whole is
//! not atomic; the report says exactly which chunks took effect.

use doc_store::{DocumentStore, WriteBatch, WriteOp};
use serde::Serialize;
use shared::error::AppError;

/// What to do when a chunk fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Stop at the first failed chunk; later chunks are never sent
    StopOnFailure,
    /// Keep committing the remaining chunks
    ContinueOnFailure,
}

/// One chunk that did not commit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkFailure {
    /// Zero-based chunk index
    pub chunk: usize,
    pub ops: usize,
    pub message: String,
}

/// Outcome of a chunked run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_ops: usize,
    pub committed_ops: usize,
    pub committed_chunks: usize,
    pub failures: Vec<ChunkFailure>,
}

impl BatchReport {
    /// Every operation committed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.committed_ops == self.total_ops
    }

    /// Error describing an incomplete run, `None` when complete
    pub fn into_error(self, what: &str) -> Option<AppError> {
        if self.is_complete() {
            return None;
        }
        let first = self
            .failures
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_default();
        Some(
            AppError::store(format!(
                "{} stopped after {} of {} operations: {}",
                what, self.committed_ops, self.total_ops, first
            ))
            .with_detail("committedOps", self.committed_ops)
            .with_detail("totalOps", self.total_ops),
        )
    }
}

/// Chunked committer over any [`DocumentStore`]
pub struct BoundedBatchExecutor<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    chunk_size: usize,
    policy: ChunkPolicy,
}

impl<'a, S: DocumentStore + ?Sized> BoundedBatchExecutor<'a, S> {
    /// Chunk size is `configured`, clamped below the store ceiling and to at
    /// least one operation
    pub fn new(store: &'a S, configured: usize, policy: ChunkPolicy) -> Self {
        let ceiling = store.max_batch_ops().saturating_sub(1);
        Self {
            store,
            chunk_size: configured.min(ceiling).max(1),
            policy,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Commit `ops` chunk by chunk, in order
    pub async fn run(&self, ops: Vec<WriteOp>) -> BatchReport {
        let mut report = BatchReport {
            total_ops: ops.len(),
            ..Default::default()
        };

        for (index, chunk) in ops.chunks(self.chunk_size).enumerate() {
            let len = chunk.len();
            match self.store.commit(WriteBatch::from(chunk.to_vec())).await {
                Ok(()) => {
                    report.committed_ops += len;
                    report.committed_chunks += 1;
                    tracing::debug!(chunk = index, ops = len, "Chunk committed");
                }
                Err(e) => {
                    tracing::warn!(chunk = index, ops = len, error = %e, "Chunk failed");
                    report.failures.push(ChunkFailure {
                        chunk: index,
                        ops: len,
                        message: e.to_string(),
                    });
                    if self.policy == ChunkPolicy::StopOnFailure {
                        break;
                    }
                }
            }
        }
        report
    }
}
