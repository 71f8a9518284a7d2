//! Document store trait

use async_trait::async_trait;

use crate::document::{Document, Fields, WriteBatch, WriteOp};
use crate::error::StoreResult;
use crate::path::{CollectionPath, DocPath};

/// Asynchronous request/response access to a hierarchical document store
///
/// Every method is one network round trip for remote implementations. The
/// only consistency boundary is [`commit`](DocumentStore::commit): a batch is
/// applied entirely or not at all, and is limited to
/// [`max_batch_ops`](DocumentStore::max_batch_ops) operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    /// Read every document directly inside a collection
    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>>;

    /// Read every document, anywhere in the tree, whose parent collection id
    /// is `collection_id`
    async fn collection_group(&self, collection_id: &str) -> StoreResult<Vec<Document>>;

    /// Apply a batch atomically
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Largest number of operations accepted by a single commit
    fn max_batch_ops(&self) -> usize;

    async fn set(&self, path: &DocPath, fields: Fields) -> StoreResult<()> {
        self.commit(WriteBatch::from(vec![WriteOp::set(path.clone(), fields)]))
            .await
    }

    /// Create-or-merge: never removes fields already on the document
    async fn set_merge(&self, path: &DocPath, fields: Fields) -> StoreResult<()> {
        self.commit(WriteBatch::from(vec![WriteOp::set_merge(
            path.clone(),
            fields,
        )]))
        .await
    }

    async fn update(&self, path: &DocPath, fields: Fields, remove: Vec<String>) -> StoreResult<()> {
        self.commit(WriteBatch::from(vec![WriteOp::Update {
            path: path.clone(),
            fields,
            remove,
        }]))
        .await
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.commit(WriteBatch::from(vec![WriteOp::delete(path.clone())]))
            .await
    }

    /// Create a document with a generated id
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<Document> {
        let path = collection.new_doc();
        self.set(&path, fields.clone()).await?;
        Ok(Document::new(path, fields))
    }
}
