//! In-process document store
//!
//! Same semantics as the remote store (atomic commits, batch ceiling, merge
//! writes, documents independent of their ancestors) with request counters and
//! fault injection so partial-failure paths can be exercised.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::DEFAULT_MAX_BATCH_OPS;
use crate::document::{Document, Fields, WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocPath};
use crate::store::DocumentStore;

#[derive(Debug, Default)]
struct Faults {
    /// Commits still allowed to succeed before every further commit fails
    commits_before_failure: Option<usize>,
    /// Collection paths (for `list`) or collection ids (for `collection_group`)
    failing_reads: HashSet<String>,
}

/// Document store held in process memory
#[derive(Debug)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocPath, Fields>>,
    faults: RwLock<Faults>,
    max_batch_ops: usize,
    requests: AtomicUsize,
    commits: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_batch_ops(DEFAULT_MAX_BATCH_OPS)
    }

    pub fn with_max_batch_ops(max_batch_ops: usize) -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            faults: RwLock::new(Faults::default()),
            max_batch_ops: max_batch_ops.max(1),
            requests: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    /// Seed a document directly, bypassing counters and faults
    pub fn insert(&self, path: DocPath, fields: Fields) {
        self.docs.write().insert(path, fields);
    }

    /// Read a document directly, bypassing counters and faults
    pub fn fields(&self, path: &DocPath) -> Option<Fields> {
        self.docs.read().get(path).cloned()
    }

    pub fn contains(&self, path: &DocPath) -> bool {
        self.docs.read().contains_key(path)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Every stored path, in order
    pub fn paths(&self) -> Vec<DocPath> {
        self.docs.read().keys().cloned().collect()
    }

    /// Round trips served so far (reads and commits, failed ones included)
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Commits applied so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Let `n` more commits succeed, then fail every commit after that
    pub fn fail_commits_after(&self, n: usize) {
        self.faults.write().commits_before_failure = Some(n);
    }

    /// Make reads of a collection path (`list`) or collection id
    /// (`collection_group`) fail
    pub fn fail_reads(&self, collection: &str) {
        self.faults.write().failing_reads.insert(collection.to_string());
    }

    pub fn clear_faults(&self) {
        *self.faults.write() = Faults::default();
    }

    fn check_read(&self, key: &str) -> StoreResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.faults.read().failing_reads.contains(key) {
            return Err(StoreError::Unavailable(format!("read of {} refused", key)));
        }
        Ok(())
    }

    fn check_commit(&self) -> StoreResult<()> {
        let mut faults = self.faults.write();
        match &mut faults.commits_before_failure {
            Some(0) => Err(StoreError::Unavailable("commit refused".to_string())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn apply(docs: &mut BTreeMap<DocPath, Fields>, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set {
            path,
            fields,
            merge: true,
        } => {
            let doc = docs.entry(path).or_default();
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }
        WriteOp::Set {
            path,
            fields,
            merge: false,
        } => {
            docs.insert(path, fields);
        }
        WriteOp::Update {
            path,
            fields,
            remove,
        } => {
            let doc = docs
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            for key in remove {
                doc.remove(&key);
            }
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }
        WriteOp::Delete { path } => {
            docs.remove(&path);
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        self.check_read(&path.parent().to_string())?;
        Ok(self
            .docs
            .read()
            .get(path)
            .map(|fields| Document::new(path.clone(), fields.clone())))
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
        self.check_read(&collection.to_string())?;
        Ok(self
            .docs
            .read()
            .iter()
            .filter(|(path, _)| &path.parent() == collection)
            .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
            .collect())
    }

    async fn collection_group(&self, collection_id: &str) -> StoreResult<Vec<Document>> {
        self.check_read(collection_id)?;
        Ok(self
            .docs
            .read()
            .iter()
            .filter(|(path, _)| path.parent().id() == collection_id)
            .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchLimitExceeded {
                ops: batch.len(),
                limit: self.max_batch_ops,
            });
        }
        self.check_commit()?;

        let mut docs = self.docs.write();
        let mut staged = docs.clone();
        for op in batch.into_ops() {
            apply(&mut staged, op)?;
        }
        *docs = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_merge_keeps_sibling_fields() {
        let store = MemoryStore::new();
        let path = DocPath::parse("c/LG").unwrap();
        store.insert(path.clone(), fields(json!({ "name": "LG", "logo": "lg.png" })));

        store
            .set_merge(&path, fields(json!({ "name": "LG" })))
            .await
            .unwrap();

        let stored = store.fields(&path).unwrap();
        assert_eq!(stored.get("logo"), Some(&json!("lg.png")));
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let store = MemoryStore::new();
        let a = DocPath::parse("c/a").unwrap();
        let missing = DocPath::parse("c/missing").unwrap();

        let batch = WriteBatch::from(vec![
            WriteOp::set(a.clone(), fields(json!({ "x": 1 }))),
            WriteOp::update(missing, fields(json!({ "x": 2 }))),
        ]);
        let err = store.commit(batch).await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!store.contains(&a));
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_ceiling() {
        let store = MemoryStore::with_max_batch_ops(2);
        let batch: WriteBatch = (0..3)
            .map(|i| WriteOp::delete(DocPath::parse(&format!("c/{}", i)).unwrap()))
            .collect();
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::BatchLimitExceeded { ops: 3, limit: 2 }
        ));
    }

    #[tokio::test]
    async fn test_fail_commits_after() {
        let store = MemoryStore::new();
        store.fail_commits_after(1);
        let path = DocPath::parse("c/a").unwrap();
        assert!(store.set(&path, Fields::new()).await.is_ok());
        assert!(store.set(&path, Fields::new()).await.is_err());
        store.clear_faults();
        assert!(store.set(&path, Fields::new()).await.is_ok());
    }
}
