//! Product Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Product entity (leaf of company → category → subcategory → product)
///
/// Always the canonical view: legacy field names have been folded and
/// `discount` is derived from `price` / `min_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Generated leaf id
    pub id: String,
    /// Full storage path, e.g. `admin-data/root/products/LG/categories/TV/...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub name: String,
    pub price: f64,
    pub min_price: f64,
    /// Percentage, `(price - min_price) / price * 100`
    pub discount: f64,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub incentive: f64,
    /// Remaining stored fields (rating, stock, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Numeric rating, if the stored record carries one
    pub fn rating(&self) -> Option<f64> {
        self.extra.get("rating").and_then(numeric)
    }

    /// Stock count, if the stored record carries one
    pub fn stock(&self) -> Option<f64> {
        self.extra.get("stock").and_then(numeric)
    }
}

/// Accepts JSON numbers and numeric strings (spreadsheet imports store both)
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Create / import product payload
///
/// Ancestor names are optional; blank or absent names become `"Unknown"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub min_price: f64,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub incentive: f64,
}

/// Update product payload
///
/// Hierarchy fields are not updatable: a product never moves between
/// subtrees, it is deleted and re-added instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub min_price: Option<f64>,
    pub incentive: Option<f64>,
}
