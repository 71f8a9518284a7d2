//! Dashboard statistics over the in-memory snapshots

use shared::models::{CatalogStats, DistributionEntry, PriceRangeCount, Product, TopProduct};
use std::cmp::Ordering;

use super::UNKNOWN;

/// Companies shown in the distribution chart
const TOP_COMPANIES: usize = 6;
/// Rows in the top products table
const TOP_PRODUCTS: usize = 5;

/// Price bands: label and half-open `[low, high)` range
const PRICE_BANDS: [(&str, f64, f64); 4] = [
    ("0-20k", 0.0, 20_000.0),
    ("20k-40k", 20_000.0, 40_000.0),
    ("40k-60k", 40_000.0, 60_000.0),
    ("60k+", 60_000.0, f64::INFINITY),
];

/// Add `amount` to the entry called `name`, keeping first-seen order
fn accumulate(entries: &mut Vec<DistributionEntry>, name: &str, amount: f64) {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(entry) => entry.value += amount,
        None => entries.push(DistributionEntry {
            name: name.to_string(),
            value: amount,
        }),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute(products: &[Product], total_employees: usize) -> CatalogStats {
    let ratings: Vec<f64> = products
        .iter()
        .filter_map(Product::rating)
        .filter(|r| r.is_finite() && *r > 0.0)
        .collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        round1(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let mut category_distribution = Vec::new();
    let mut company_distribution = Vec::new();
    for product in products {
        accumulate(&mut category_distribution, &product.category, 1.0);

        let company = if product.company.is_empty() {
            UNKNOWN
        } else {
            product.company.as_str()
        };
        // missing or zero stock counts as one unit
        let stock = product.stock().filter(|s| *s != 0.0).unwrap_or(1.0);
        accumulate(&mut company_distribution, company, stock);
    }
    company_distribution.retain(|e| e.value > 0.0);
    company_distribution.truncate(TOP_COMPANIES);

    let price_ranges = PRICE_BANDS
        .iter()
        .map(|(label, low, high)| PriceRangeCount {
            range: label.to_string(),
            count: products
                .iter()
                .filter(|p| p.price != 0.0 && p.price >= *low && p.price < *high)
                .count(),
        })
        .filter(|band| band.count > 0)
        .collect();

    let mut ranked: Vec<&Product> = products
        .iter()
        .filter(|p| p.rating().is_some_and(|r| r != 0.0) || p.price != 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        let by_rating = b
            .rating()
            .unwrap_or(0.0)
            .partial_cmp(&a.rating().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal);
        by_rating.then_with(|| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal))
    });
    let top_products = ranked
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|p| TopProduct {
            id: p.id.clone(),
            name: p.name.clone(),
            company: p.company.clone(),
            price: p.price,
            rating: p.rating(),
        })
        .collect();

    CatalogStats {
        total_employees,
        total_products: products.len(),
        total_incentives: products.iter().map(|p| p.incentive).sum(),
        average_rating,
        category_distribution,
        company_distribution,
        price_ranges,
        top_products,
    }
}
