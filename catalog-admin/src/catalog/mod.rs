//! Catalog data-access and mutation core
//!
//! Persisted layout below the companies root:
//!
//! ```text
//! {companiesRoot}/{company}
//!   categories/{category}
//!     subcategories/{subcategory}
//!       products/{productId}
//! ```
//!
//! # Modules
//!
//! - [`schema`] - legacy/current field reconciliation and derived discount
//! - [`leaf`] - leaf-vs-noise classification of cross-tree scan results
//! - [`writer`] - ancestor upserts and single product writes
//! - [`cascade`] - subtree deletes within the batch ceiling
//! - [`importer`] - bulk import
//! - [`stats`] - dashboard figures

pub mod cascade;
pub mod importer;
pub mod leaf;
pub mod schema;
pub mod stats;
pub mod writer;

use doc_store::{CollectionPath, DocPath, StoreError};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::ProductInput;

pub use cascade::{CascadeDeleter, CascadeOverflow, CascadeRoot};
pub use importer::BulkImporter;
pub use leaf::{LeafPath, classify, is_leaf_path};
pub use writer::CatalogWriter;

/// Collection holding categories under a company
pub const CATEGORIES: &str = "categories";
/// Collection holding subcategories under a category
pub const SUBCATEGORIES: &str = "subcategories";
/// Collection holding leaf products under a subcategory
pub const PRODUCTS: &str = "products";

/// Name used for blank or absent ancestor names
pub const UNKNOWN: &str = "Unknown";

/// Trimmed ancestor names of one product
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ancestry {
    pub company: String,
    pub category: String,
    pub subcategory: String,
}

fn name_or_unknown(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

impl Ancestry {
    pub fn new(
        company: Option<&str>,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Self {
        Self {
            company: name_or_unknown(company),
            category: name_or_unknown(category),
            subcategory: name_or_unknown(subcategory),
        }
    }

    pub fn from_input(input: &ProductInput) -> Self {
        Self::new(
            input.company.as_deref(),
            input.category.as_deref(),
            input.subcategory.as_deref(),
        )
    }

    pub fn company_path(&self, companies: &CollectionPath) -> AppResult<DocPath> {
        child(companies, &self.company)
    }

    pub fn category_path(&self, companies: &CollectionPath) -> AppResult<DocPath> {
        let company = self.company_path(companies)?;
        child(&sub_collection(&company, CATEGORIES)?, &self.category)
    }

    pub fn subcategory_path(&self, companies: &CollectionPath) -> AppResult<DocPath> {
        let category = self.category_path(companies)?;
        child(&sub_collection(&category, SUBCATEGORIES)?, &self.subcategory)
    }

    /// Collection receiving this ancestry's leaf products
    pub fn products_collection(&self, companies: &CollectionPath) -> AppResult<CollectionPath> {
        sub_collection(&self.subcategory_path(companies)?, PRODUCTS)
    }
}

/// Document named `name` inside `collection`; names that cannot be a path
/// segment are rejected as invalid input
pub(crate) fn child(collection: &CollectionPath, name: &str) -> AppResult<DocPath> {
    collection.doc(name).map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("'{}' cannot be used as a catalog name", name),
        )
        .with_detail("name", name)
    })
}

pub(crate) fn sub_collection(doc: &DocPath, id: &str) -> AppResult<CollectionPath> {
    doc.collection(id).map_err(AppError::from)
}

/// Parse a configured root collection
pub(crate) fn root_collection(raw: &str) -> AppResult<CollectionPath> {
    CollectionPath::parse(raw).map_err(|e: StoreError| {
        AppError::config(format!("Invalid root collection '{}': {}", raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_become_unknown() {
        let ancestry = Ancestry::new(Some("  LG "), Some("   "), None);
        assert_eq!(ancestry.company, "LG");
        assert_eq!(ancestry.category, UNKNOWN);
        assert_eq!(ancestry.subcategory, UNKNOWN);
    }

    #[test]
    fn test_ancestor_paths() {
        let companies = CollectionPath::parse("admin-data/root/products").unwrap();
        let ancestry = Ancestry::new(Some("LG"), Some("TV"), Some("OLED"));
        assert_eq!(
            ancestry.products_collection(&companies).unwrap().to_string(),
            "admin-data/root/products/LG/categories/TV/subcategories/OLED/products"
        );
    }

    #[test]
    fn test_slash_in_name_rejected() {
        let companies = CollectionPath::parse("admin-data/root/products").unwrap();
        let ancestry = Ancestry::new(Some("Blue/Star"), None, None);
        let err = ancestry.company_path(&companies).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
