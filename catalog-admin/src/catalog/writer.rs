//! Product writes
//!
//! Ancestors are upserted with merge semantics before the leaf is written, so
//! touching a company, category or subcategory never clobbers fields other
//! tools keep on those documents.

use doc_store::{CollectionPath, DocPath, DocumentStore, Fields, StoreError};
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Product, ProductInput, ProductUpdate};

use super::schema::{self, SUPERSEDED_ON_WRITE};
use super::{Ancestry, leaf};

/// `{ name }` body of an ancestor upsert
pub(crate) fn ancestor_fields(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), json!(name));
    fields
}

/// Single-document catalog writes
pub struct CatalogWriter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    companies: &'a CollectionPath,
}

impl<'a, S: DocumentStore + ?Sized> CatalogWriter<'a, S> {
    pub fn new(store: &'a S, companies: &'a CollectionPath) -> Self {
        Self { store, companies }
    }

    /// Upsert company → category → subcategory, returning the subcategory
    pub async fn ensure_ancestors(&self, ancestry: &Ancestry) -> AppResult<DocPath> {
        let company = ancestry.company_path(self.companies)?;
        self.store
            .set_merge(&company, ancestor_fields(&ancestry.company))
            .await?;

        let category = ancestry.category_path(self.companies)?;
        self.store
            .set_merge(&category, ancestor_fields(&ancestry.category))
            .await?;

        let subcategory = ancestry.subcategory_path(self.companies)?;
        self.store
            .set_merge(&subcategory, ancestor_fields(&ancestry.subcategory))
            .await?;

        Ok(subcategory)
    }

    /// Create a new leaf; identical input always yields a distinct product
    pub async fn add_product(&self, input: &ProductInput) -> AppResult<Product> {
        schema::validate_input(input)?;
        let ancestry = Ancestry::from_input(input);
        // Reject unusable names before the first upsert
        let products = ancestry.products_collection(self.companies)?;

        self.ensure_ancestors(&ancestry).await?;
        let doc = self
            .store
            .add(&products, schema::stored_fields(input, &ancestry))
            .await?;

        tracing::info!(
            id = %doc.id(),
            company = %ancestry.company,
            category = %ancestry.category,
            subcategory = %ancestry.subcategory,
            "Product added"
        );
        leaf::classify(&doc)
            .ok_or_else(|| AppError::internal(format!("Written product {} is not a leaf", doc.path)))
    }

    /// Patch an existing leaf and return the merged record
    pub async fn update_product(
        &self,
        path: &DocPath,
        current: &Product,
        update: &ProductUpdate,
    ) -> AppResult<Product> {
        schema::validate_amounts(update.price, update.min_price, update.incentive)?;

        let mut merged = current.clone();
        if let Some(name) = &update.name {
            merged.name = name.clone();
        }
        if let Some(price) = update.price {
            merged.price = price;
        }
        if let Some(min_price) = update.min_price {
            merged.min_price = min_price;
        }
        if let Some(incentive) = update.incentive {
            merged.incentive = incentive;
        }
        merged.discount = schema::discount(merged.price, merged.min_price);

        let mut fields = Fields::new();
        fields.insert("productName".into(), json!(merged.name));
        fields.insert("price".into(), json!(merged.price));
        fields.insert("bottomPrice".into(), json!(merged.min_price));
        fields.insert("incentive".into(), json!(merged.incentive));
        fields.insert(schema::DISCOUNT.into(), json!(merged.discount));
        let remove = SUPERSEDED_ON_WRITE.iter().map(|k| k.to_string()).collect();

        self.store
            .update(path, fields, remove)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AppError::new(ErrorCode::ProductNotFound)
                    .with_detail("path", path.to_string()),
                other => other.into(),
            })?;

        tracing::info!(id = %current.id, "Product updated");
        Ok(merged)
    }

    pub async fn delete_product(&self, path: &DocPath) -> AppResult<()> {
        self.store.delete(path).await?;
        tracing::info!(path = %path, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::MemoryStore;

    fn companies() -> CollectionPath {
        CollectionPath::parse("admin-data/root/products").unwrap()
    }

    fn input() -> ProductInput {
        ProductInput {
            name: "OLED 55".into(),
            price: 1000.0,
            min_price: 800.0,
            company: Some(" LG ".into()),
            category: Some("TV".into()),
            subcategory: Some("OLED".into()),
            incentive: 100.0,
        }
    }

    #[tokio::test]
    async fn test_add_creates_ancestors_and_leaf() {
        let store = MemoryStore::new();
        let companies = companies();
        let writer = CatalogWriter::new(&store, &companies);

        let product = writer.add_product(&input()).await.unwrap();

        assert_eq!(product.company, "LG");
        assert_eq!(product.discount, 20.0);
        assert_eq!(store.len(), 4);
        let lg = companies.doc("LG").unwrap();
        assert_eq!(store.fields(&lg).unwrap()["name"], json!("LG"));
        let leaf = DocPath::parse(product.path.as_deref().unwrap()).unwrap();
        assert_eq!(store.fields(&leaf).unwrap()["company"], json!("LG"));
    }

    #[tokio::test]
    async fn test_add_twice_creates_two_leaves() {
        let store = MemoryStore::new();
        let companies = companies();
        let writer = CatalogWriter::new(&store, &companies);

        let a = writer.add_product(&input()).await.unwrap();
        let b = writer.add_product(&input()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_ancestor_upsert_keeps_sibling_fields() {
        let store = MemoryStore::new();
        let companies = companies();
        let lg = companies.doc("LG").unwrap();
        store.insert(lg.clone(), ancestor_fields("LG").into_iter().chain([("logo".to_string(), json!("lg.png"))]).collect());

        CatalogWriter::new(&store, &companies)
            .add_product(&input())
            .await
            .unwrap();

        assert_eq!(store.fields(&lg).unwrap()["logo"], json!("lg.png"));
    }

    #[tokio::test]
    async fn test_invalid_price_sends_nothing() {
        let store = MemoryStore::new();
        let companies = companies();
        let mut bad = input();
        bad.min_price = -5.0;

        let err = CatalogWriter::new(&store, &companies)
            .add_product(&bad)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_rewrites_legacy_fields() {
        let store = MemoryStore::new();
        let companies = companies();
        let writer = CatalogWriter::new(&store, &companies);
        let product = writer.add_product(&input()).await.unwrap();
        let path = DocPath::parse(product.path.as_deref().unwrap()).unwrap();
        // a copy written by newer tooling
        store.update(&path, Fields::from_iter([("minPrice".to_string(), json!(1))]), vec![]).await.unwrap();

        let update = ProductUpdate {
            min_price: Some(900.0),
            ..Default::default()
        };
        let merged = writer.update_product(&path, &product, &update).await.unwrap();

        assert_eq!(merged.min_price, 900.0);
        assert_eq!(merged.discount, 10.0);
        let stored = store.fields(&path).unwrap();
        assert_eq!(stored["bottomPrice"], json!(900.0));
        assert!(!stored.contains_key("minPrice"));
        assert_eq!(stored["productName"], json!("OLED 55"));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let companies = companies();
        let writer = CatalogWriter::new(&store, &companies);
        let product = writer.add_product(&input()).await.unwrap();
        let path = DocPath::parse(product.path.as_deref().unwrap()).unwrap();
        writer.delete_product(&path).await.unwrap();

        let err = writer
            .update_product(&path, &product, &ProductUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }
}
