//! Leaf classification
//!
//! A `products` collection-group scan also returns the company documents
//! (the companies root collection is itself named `products`) and anything
//! else stored under a `products` collection. Only documents at
//! `.../{company}/categories/{category}/subcategories/{subcategory}/products/{id}`
//! with a numeric price are catalog products.

use doc_store::{DocPath, Document, Fields};
use serde_json::Value;
use shared::models::Product;

use super::schema::{self, DISCOUNT, MIN_PRICE, NAME, PRICE};
use super::{CATEGORIES, PRODUCTS, SUBCATEGORIES};

/// Ancestor names and id of a leaf product, parsed from its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPath {
    pub company: String,
    pub category: String,
    pub subcategory: String,
    pub id: String,
}

impl LeafPath {
    pub fn parse(path: &DocPath) -> Option<Self> {
        let s = path.segments();
        let n = s.len();
        if n < 8
            || s[n - 2] != PRODUCTS
            || s[n - 4] != SUBCATEGORIES
            || s[n - 6] != CATEGORIES
        {
            return None;
        }
        Some(Self {
            company: s[n - 7].clone(),
            category: s[n - 5].clone(),
            subcategory: s[n - 3].clone(),
            id: s[n - 1].clone(),
        })
    }
}

pub fn is_leaf_path(path: &DocPath) -> bool {
    LeafPath::parse(path).is_some()
}

/// Canonical product for a scanned document, `None` for noise
pub fn classify(doc: &Document) -> Option<Product> {
    let leaf = LeafPath::parse(&doc.path)?;
    let mut fields = schema::normalize_fields(&doc.fields);

    let price = fields.get(PRICE.canonical).and_then(Value::as_f64)?;
    let min_price = take_f64(&mut fields, MIN_PRICE.canonical);
    let discount = take_f64(&mut fields, DISCOUNT);
    let incentive = take_f64(&mut fields, "incentive");
    let name = match fields.remove(NAME.canonical) {
        Some(Value::String(name)) => name,
        _ => String::new(),
    };
    for key in [PRICE.canonical, "company", "category", "subcategory", "id", "path"] {
        fields.remove(key);
    }

    Some(Product {
        id: leaf.id,
        path: Some(doc.path.to_string()),
        name,
        price,
        min_price,
        discount,
        company: leaf.company,
        category: leaf.category,
        subcategory: leaf.subcategory,
        incentive,
        extra: fields,
    })
}

fn take_f64(fields: &mut Fields, key: &str) -> f64 {
    fields.remove(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEAF: &str = "admin-data/root/products/LG/categories/TV/subcategories/OLED/products/p1";

    fn doc(path: &str, value: Value) -> Document {
        Document::new(
            DocPath::parse(path).unwrap(),
            value.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_leaf_accepted() {
        let product = classify(&doc(
            LEAF,
            json!({
                "productName": "C3", "price": 1000, "bottomPrice": 800,
                "company": "stale", "incentive": 50, "rating": 4.5
            }),
        ))
        .unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(product.company, "LG");
        assert_eq!(product.category, "TV");
        assert_eq!(product.subcategory, "OLED");
        assert_eq!(product.name, "C3");
        assert_eq!(product.discount, 20.0);
        assert_eq!(product.incentive, 50.0);
        assert_eq!(product.path.as_deref(), Some(LEAF));
        assert_eq!(product.rating(), Some(4.5));
        assert!(!product.extra.contains_key("company"));
    }

    #[test]
    fn test_company_document_rejected() {
        assert!(classify(&doc("admin-data/root/products/LG", json!({ "name": "LG", "price": 1 }))).is_none());
    }

    #[test]
    fn test_missing_levels_rejected() {
        let paths = [
            "admin-data/root/products/LG/subcategories/OLED/products/p1",
            "admin-data/root/products/LG/categories/TV/products/p1",
            "admin-data/root/products/LG/categories/TV/subcategories/OLED/items/p1",
            "x/LG/shelves/TV/subcategories/OLED/products/p1",
        ];
        for path in paths {
            assert!(
                classify(&doc(path, json!({ "price": 1 }))).is_none(),
                "{} should be noise",
                path
            );
        }
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        assert!(classify(&doc(LEAF, json!({ "price": "1000" }))).is_none());
        assert!(classify(&doc(LEAF, json!({ "price": true, "name": "x" }))).is_none());
    }

    #[test]
    fn test_absent_price_is_zero() {
        let product = classify(&doc(LEAF, json!({ "name": "x" }))).unwrap();
        assert_eq!(product.price, 0.0);
    }
}
