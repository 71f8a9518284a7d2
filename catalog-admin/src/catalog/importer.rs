//! Bulk product import
//!
//! Every record gets the same ancestor chain as a single add, with ancestor
//! upserts deduplicated across the input. By default the whole import is one
//! atomic batch; an import too large for one batch is refused before any
//! write. With chunking enabled the writes go through the bounded executor,
//! ancestors first, and atomicity is given up for size.

use doc_store::{CollectionPath, DocPath, DocumentStore, WriteBatch, WriteOp};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::ProductInput;
use std::collections::HashSet;
use std::path::Path;

use super::writer::ancestor_fields;
use super::{Ancestry, schema};
use crate::batch::{BoundedBatchExecutor, ChunkPolicy};

/// Read import records from a JSON array file
pub fn load_records(path: &Path) -> AppResult<Vec<ProductInput>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::invalid_request(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("Invalid import file {}: {}", path.display(), e),
        )
    })
}

/// Writes an import will commit
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    /// Deduplicated ancestor upserts, outermost first
    pub ancestors: Vec<WriteOp>,
    /// One new leaf per record, in input order
    pub leaves: Vec<WriteOp>,
}

impl ImportPlan {
    pub fn len(&self) -> usize {
        self.ancestors.len() + self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ancestors.into_iter().chain(self.leaves).collect()
    }
}

pub struct BulkImporter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    companies: &'a CollectionPath,
    chunked: bool,
    chunk_size: usize,
}

impl<'a, S: DocumentStore + ?Sized> BulkImporter<'a, S> {
    pub fn new(store: &'a S, companies: &'a CollectionPath) -> Self {
        Self {
            store,
            companies,
            chunked: false,
            chunk_size: store.max_batch_ops(),
        }
    }

    /// Commit through the bounded executor instead of one batch
    pub fn chunked(mut self, chunk_size: usize) -> Self {
        self.chunked = true;
        self.chunk_size = chunk_size;
        self
    }

    /// Validate every record and build the writes; touches no store
    pub fn plan(&self, records: &[ProductInput]) -> AppResult<ImportPlan> {
        let mut plan = ImportPlan::default();
        let mut seen: HashSet<DocPath> = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            let invalid = |e: AppError| {
                AppError::with_message(
                    ErrorCode::ImportInvalidRecord,
                    format!("Record {}: {}", index, e.message),
                )
                .with_detail("index", index)
            };
            schema::validate_input(record).map_err(invalid)?;

            let ancestry = Ancestry::from_input(record);
            let chain = [
                (ancestry.company_path(self.companies).map_err(invalid)?, &ancestry.company),
                (ancestry.category_path(self.companies).map_err(invalid)?, &ancestry.category),
                (ancestry.subcategory_path(self.companies).map_err(invalid)?, &ancestry.subcategory),
            ];
            for (path, name) in chain {
                if seen.insert(path.clone()) {
                    plan.ancestors.push(WriteOp::set_merge(path, ancestor_fields(name)));
                }
            }

            let leaf = ancestry.products_collection(self.companies)?.new_doc();
            plan.leaves
                .push(WriteOp::set(leaf, schema::stored_fields(record, &ancestry)));
        }
        Ok(plan)
    }

    /// Import `records`, returning how many products were written
    pub async fn import(&self, records: &[ProductInput]) -> AppResult<usize> {
        let plan = self.plan(records)?;
        if plan.is_empty() {
            return Ok(0);
        }
        let count = plan.leaves.len();
        let total = plan.len();
        let limit = self.store.max_batch_ops();

        if self.chunked {
            let executor =
                BoundedBatchExecutor::new(self.store, self.chunk_size, ChunkPolicy::StopOnFailure);
            let report = executor.run(plan.into_ops()).await;
            if let Some(err) = report.into_error("Import") {
                return Err(err);
            }
        } else {
            if total > limit {
                return Err(AppError::batch_overflow(total, limit).with_detail("records", count));
            }
            self.store.commit(WriteBatch::from(plan.into_ops())).await?;
        }

        tracing::info!(records = count, ops = total, chunked = self.chunked, "Products imported");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::MemoryStore;

    fn record(company: &str, category: &str, subcategory: &str) -> ProductInput {
        ProductInput {
            name: format!("{} item", subcategory),
            price: 100.0,
            min_price: 90.0,
            company: Some(company.into()),
            category: Some(category.into()),
            subcategory: Some(subcategory.into()),
            incentive: 5.0,
        }
    }

    #[test]
    fn test_plan_dedupes_ancestors() {
        let store = MemoryStore::new();
        let companies = CollectionPath::parse("products").unwrap();
        let plan = BulkImporter::new(&store, &companies)
            .plan(&[
                record("LG", "TV", "OLED"),
                record("LG", "TV", "OLED"),
                record("LG", "TV", "QNED"),
                record("Sony", "TV", "OLED"),
            ])
            .unwrap();
        // LG, LG/TV, LG/TV/OLED, LG/TV/QNED, Sony, Sony/TV, Sony/TV/OLED
        assert_eq!(plan.ancestors.len(), 7);
        assert_eq!(plan.leaves.len(), 4);
        assert_eq!(store.request_count(), 0);
    }

    #[test]
    fn test_plan_reports_bad_record_index() {
        let store = MemoryStore::new();
        let companies = CollectionPath::parse("products").unwrap();
        let mut bad = record("LG", "TV", "OLED");
        bad.price = f64::NAN;
        let err = BulkImporter::new(&store, &companies)
            .plan(&[record("LG", "TV", "OLED"), bad])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportInvalidRecord);
        assert!(err.message.starts_with("Record 1:"));
    }

    #[tokio::test]
    async fn test_oversize_import_rejected_before_writes() {
        let store = MemoryStore::with_max_batch_ops(5);
        let companies = CollectionPath::parse("products").unwrap();
        let records: Vec<_> = (0..3).map(|_| record("LG", "TV", "OLED")).collect();

        let err = BulkImporter::new(&store, &companies)
            .import(&records)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BatchOverflow);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_chunked_import_writes_everything() {
        let store = MemoryStore::with_max_batch_ops(5);
        let companies = CollectionPath::parse("products").unwrap();
        let records: Vec<_> = (0..3).map(|_| record("LG", "TV", "OLED")).collect();

        let count = BulkImporter::new(&store, &companies)
            .chunked(400)
            .import(&records)
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(store.len(), 6);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_import() {
        let store = MemoryStore::new();
        let companies = CollectionPath::parse("products").unwrap();
        assert_eq!(BulkImporter::new(&store, &companies).import(&[]).await.unwrap(), 0);
        assert_eq!(store.request_count(), 0);
    }
}
