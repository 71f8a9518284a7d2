//! Cascading subtree deletes
//!
//! Descendants are enumerated fresh on every call and queued deepest level
//! first with the subtree root last. A queue that fits the store ceiling is
//! committed as one atomic batch. A larger queue is either rejected or split
//! into leaf-first chunks that stop at the first failure, so an interrupted
//! delete never leaves a descendant whose ancestor is already gone.

use doc_store::{CollectionPath, DocPath, DocumentStore, WriteBatch, WriteOp};
use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};
use std::str::FromStr;

use super::{CATEGORIES, PRODUCTS, SUBCATEGORIES, child, sub_collection};
use crate::batch::{BoundedBatchExecutor, ChunkPolicy};

/// Handling of delete queues larger than one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CascadeOverflow {
    /// Commit leaf-first chunks, stopping at the first failure
    #[default]
    Split,
    /// Fail with `BatchOverflow` before writing anything
    Reject,
}

impl FromStr for CascadeOverflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split" => Ok(Self::Split),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown cascade overflow mode '{}'", other)),
        }
    }
}

/// Root of a subtree delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeRoot {
    Company {
        company: String,
    },
    Category {
        company: String,
        category: String,
    },
    Subcategory {
        company: String,
        category: String,
        subcategory: String,
    },
}

fn required(kind: &str, name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::HierarchyNameRequired,
            format!("{} name is required", kind),
        )
        .with_detail("field", kind.to_ascii_lowercase()));
    }
    Ok(trimmed.to_string())
}

impl CascadeRoot {
    pub fn company(company: &str) -> AppResult<Self> {
        Ok(Self::Company {
            company: required("Company", company)?,
        })
    }

    pub fn category(company: &str, category: &str) -> AppResult<Self> {
        Ok(Self::Category {
            company: required("Company", company)?,
            category: required("Category", category)?,
        })
    }

    pub fn subcategory(company: &str, category: &str, subcategory: &str) -> AppResult<Self> {
        Ok(Self::Subcategory {
            company: required("Company", company)?,
            category: required("Category", category)?,
            subcategory: required("Subcategory", subcategory)?,
        })
    }

    /// Document at the root of the subtree
    pub fn doc_path(&self, companies: &CollectionPath) -> AppResult<DocPath> {
        match self {
            Self::Company { company } => child(companies, company),
            Self::Category { company, category } => {
                let company = child(companies, company)?;
                child(&sub_collection(&company, CATEGORIES)?, category)
            }
            Self::Subcategory {
                company,
                category,
                subcategory,
            } => {
                let company = child(companies, company)?;
                let category = child(&sub_collection(&company, CATEGORIES)?, category)?;
                child(&sub_collection(&category, SUBCATEGORIES)?, subcategory)
            }
        }
    }

    /// Collection ids below the root, outermost first
    pub fn levels(&self) -> &'static [&'static str] {
        const LEVELS: [&str; 3] = [CATEGORIES, SUBCATEGORIES, PRODUCTS];
        match self {
            Self::Company { .. } => &LEVELS,
            Self::Category { .. } => &LEVELS[1..],
            Self::Subcategory { .. } => &LEVELS[2..],
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Company { company } => format!("company {}", company),
            Self::Category { company, category } => format!("category {}/{}", company, category),
            Self::Subcategory {
                company,
                category,
                subcategory,
            } => format!("subcategory {}/{}/{}", company, category, subcategory),
        }
    }
}

/// Every document of the subtree under `root`, deepest level first, `root` last
pub async fn collect_subtree<S: DocumentStore + ?Sized>(
    store: &S,
    root: &DocPath,
    levels: &[&str],
) -> AppResult<Vec<DocPath>> {
    let mut by_level: Vec<Vec<DocPath>> = Vec::with_capacity(levels.len());
    let mut frontier = vec![root.clone()];

    for level in levels {
        let mut next = Vec::new();
        for parent in &frontier {
            let docs = store.list(&sub_collection(parent, level)?).await?;
            next.extend(docs.into_iter().map(|d| d.path));
        }
        by_level.push(next.clone());
        frontier = next;
    }

    let mut queue: Vec<DocPath> = by_level.into_iter().rev().flatten().collect();
    queue.push(root.clone());
    Ok(queue)
}

/// Outcome of a subtree delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOutcome {
    pub deleted: usize,
    pub batches: usize,
}

/// Subtree deletes bounded by the store's batch ceiling
pub struct CascadeDeleter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    companies: &'a CollectionPath,
    overflow: CascadeOverflow,
    chunk_size: usize,
}

impl<'a, S: DocumentStore + ?Sized> CascadeDeleter<'a, S> {
    pub fn new(
        store: &'a S,
        companies: &'a CollectionPath,
        overflow: CascadeOverflow,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            companies,
            overflow,
            chunk_size,
        }
    }

    /// Delete `root` and everything beneath it
    pub async fn delete(&self, root: &CascadeRoot) -> AppResult<CascadeOutcome> {
        let root_path = root.doc_path(self.companies)?;
        let queue = collect_subtree(self.store, &root_path, root.levels()).await?;
        tracing::debug!(root = %root.describe(), queued = queue.len(), "Subtree collected");

        let outcome = self.delete_paths(queue).await?;
        tracing::info!(
            root = %root.describe(),
            deleted = outcome.deleted,
            batches = outcome.batches,
            "Subtree deleted"
        );
        Ok(outcome)
    }

    /// Delete a prepared queue under the overflow policy
    pub async fn delete_paths(&self, queue: Vec<DocPath>) -> AppResult<CascadeOutcome> {
        let limit = self.store.max_batch_ops();
        let ops: Vec<WriteOp> = queue.into_iter().map(WriteOp::delete).collect();
        let total = ops.len();
        if total == 0 {
            return Ok(CascadeOutcome::default());
        }

        if total <= limit {
            self.store.commit(WriteBatch::from(ops)).await?;
            return Ok(CascadeOutcome {
                deleted: total,
                batches: 1,
            });
        }

        match self.overflow {
            CascadeOverflow::Reject => Err(AppError::batch_overflow(total, limit)),
            CascadeOverflow::Split => {
                tracing::warn!(ops = total, limit, "Delete exceeds one batch, splitting");
                let report = BoundedBatchExecutor::new(
                    self.store,
                    self.chunk_size,
                    ChunkPolicy::StopOnFailure,
                )
                .run(ops)
                .await;
                let outcome = CascadeOutcome {
                    deleted: report.committed_ops,
                    batches: report.committed_chunks,
                };
                match report.into_error("Delete") {
                    Some(err) => Err(err),
                    None => Ok(outcome),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::{Fields, MemoryStore};

    fn seed(store: &MemoryStore, path: &str) -> DocPath {
        let path = DocPath::parse(path).unwrap();
        store.insert(path.clone(), Fields::new());
        path
    }

    #[test]
    fn test_blank_names_rejected() {
        let err = CascadeRoot::category("LG", "  ").unwrap_err();
        assert_eq!(err.code, ErrorCode::HierarchyNameRequired);
        assert!(CascadeRoot::company("").is_err());
    }

    #[test]
    fn test_overflow_mode_parse() {
        assert_eq!("Split".parse::<CascadeOverflow>().unwrap(), CascadeOverflow::Split);
        assert_eq!("reject".parse::<CascadeOverflow>().unwrap(), CascadeOverflow::Reject);
        assert!("maybe".parse::<CascadeOverflow>().is_err());
    }

    #[tokio::test]
    async fn test_collect_subtree_is_leaf_first() {
        let store = MemoryStore::new();
        let lg = seed(&store, "products/LG");
        let tv = seed(&store, "products/LG/categories/TV");
        let oled = seed(&store, "products/LG/categories/TV/subcategories/OLED");
        let leaf = seed(&store, "products/LG/categories/TV/subcategories/OLED/products/p1");

        let queue = collect_subtree(&store, &lg, CascadeRoot::company("LG").unwrap().levels())
            .await
            .unwrap();

        assert_eq!(queue, vec![leaf, oled, tv, lg]);
    }

    #[tokio::test]
    async fn test_reject_overflow_writes_nothing() {
        let store = MemoryStore::with_max_batch_ops(3);
        let companies = CollectionPath::parse("products").unwrap();
        seed(&store, "products/LG");
        seed(&store, "products/LG/categories/TV");
        seed(&store, "products/LG/categories/TV/subcategories/OLED");
        seed(&store, "products/LG/categories/TV/subcategories/OLED/products/p1");

        let deleter = CascadeDeleter::new(&store, &companies, CascadeOverflow::Reject, 400);
        let err = deleter
            .delete(&CascadeRoot::company("LG").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BatchOverflow);
        assert_eq!(store.len(), 4);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_split_overflow_deletes_everything() {
        let store = MemoryStore::with_max_batch_ops(3);
        let companies = CollectionPath::parse("products").unwrap();
        seed(&store, "products/LG");
        seed(&store, "products/LG/categories/TV");
        seed(&store, "products/LG/categories/TV/subcategories/OLED");
        for i in 0..5 {
            seed(&store, &format!("products/LG/categories/TV/subcategories/OLED/products/p{}", i));
        }

        let outcome = CascadeDeleter::new(&store, &companies, CascadeOverflow::Split, 400)
            .delete(&CascadeRoot::company("LG").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome.deleted, 8);
        assert_eq!(outcome.batches, 4);
        assert!(store.is_empty());
    }
}
