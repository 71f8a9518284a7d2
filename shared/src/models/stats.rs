//! Dashboard statistics

use serde::{Deserialize, Serialize};

/// Named count used by the category / company charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub name: String,
    pub value: f64,
}

/// Number of products in one price band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRangeCount {
    pub range: String,
    pub count: usize,
}

/// Summary row for the top products table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub id: String,
    pub name: String,
    pub company: String,
    pub price: f64,
    pub rating: Option<f64>,
}

/// Aggregate figures over the current catalog and employee snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_employees: usize,
    pub total_products: usize,
    pub total_incentives: f64,
    /// Mean of ratings > 0, rounded to one decimal
    pub average_rating: f64,
    pub category_distribution: Vec<DistributionEntry>,
    pub company_distribution: Vec<DistributionEntry>,
    pub price_ranges: Vec<PriceRangeCount>,
    pub top_products: Vec<TopProduct>,
}
