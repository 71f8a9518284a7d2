//! Field schema reconciliation
//!
//! Product documents were written by two generations of tooling. The older
//! one stores `productName` / `productPrice` / `bottomPrice`, the current one
//! `name` / `price` / `minPrice`. Reads fold both into the canonical names
//! through [`ALIASES`]; writes use the stored (legacy) shape the mobile app
//! reads.

use doc_store::Fields;
use serde_json::{Value, json};
use shared::error::{AppError, AppResult};
use shared::models::ProductInput;

use super::Ancestry;

/// Canonical field and the stored names accepted for it, in priority order
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub stored: &'static [&'static str],
}

pub const NAME: FieldAlias = FieldAlias {
    canonical: "name",
    stored: &["name", "productName"],
};

pub const PRICE: FieldAlias = FieldAlias {
    canonical: "price",
    stored: &["price", "productPrice"],
};

pub const MIN_PRICE: FieldAlias = FieldAlias {
    canonical: "minPrice",
    stored: &["minPrice", "bottomPrice"],
};

pub const ALIASES: [FieldAlias; 3] = [NAME, PRICE, MIN_PRICE];

/// Derived field, recomputed on every read
pub const DISCOUNT: &str = "discount";

/// Aliases removed when a product is updated, so a stale canonical copy can
/// never shadow the freshly written legacy field
pub const SUPERSEDED_ON_WRITE: [&str; 3] = ["name", "minPrice", "productPrice"];

/// Discount percentage; `0` unless both prices are positive
pub fn discount(price: f64, min_price: f64) -> f64 {
    if price > 0.0 && min_price > 0.0 {
        (price - min_price) / price * 100.0
    } else {
        0.0
    }
}

impl FieldAlias {
    /// First stored value present under any alias
    fn first_present<'a>(&self, raw: &'a Fields) -> Option<&'a Value> {
        self.stored
            .iter()
            .filter_map(|key| raw.get(*key))
            .find(|v| !v.is_null())
    }

    /// First stored value that is a JSON number
    fn first_number(&self, raw: &Fields) -> Option<f64> {
        self.stored
            .iter()
            .filter_map(|key| raw.get(*key))
            .find_map(Value::as_f64)
    }

    /// First non-empty string under any alias
    fn first_string(&self, raw: &Fields) -> Option<String> {
        self.stored
            .iter()
            .filter_map(|key| raw.get(*key))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn is_alias(key: &str) -> bool {
        ALIASES.iter().any(|a| a.stored.contains(&key))
    }
}

/// Canonical view of a stored product record
///
/// `name`, `price`, `minPrice` and `discount` are always present; every other
/// stored field is carried through untouched. A `price` that is present but
/// not a number is kept verbatim so the leaf classifier can reject the
/// record. Pure and idempotent.
pub fn normalize_fields(raw: &Fields) -> Fields {
    let mut out: Fields = raw
        .iter()
        .filter(|(key, _)| !FieldAlias::is_alias(key) && key.as_str() != DISCOUNT)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    out.insert(
        NAME.canonical.to_string(),
        Value::String(NAME.first_string(raw).unwrap_or_default()),
    );

    let price = PRICE.first_number(raw);
    let price_value = match (price, PRICE.first_present(raw)) {
        (Some(p), _) => json!(p),
        (None, Some(malformed)) => malformed.clone(),
        (None, None) => json!(0.0),
    };
    out.insert(PRICE.canonical.to_string(), price_value);

    let min_price = MIN_PRICE.first_number(raw).unwrap_or(0.0);
    out.insert(MIN_PRICE.canonical.to_string(), json!(min_price));

    out.insert(
        DISCOUNT.to_string(),
        json!(discount(price.unwrap_or(0.0), min_price)),
    );
    out
}

/// Stored shape of a new leaf document
pub fn stored_fields(input: &ProductInput, ancestry: &Ancestry) -> Fields {
    let mut fields = Fields::new();
    fields.insert("productName".into(), json!(input.name));
    fields.insert("bottomPrice".into(), json!(input.min_price));
    fields.insert("price".into(), json!(input.price));
    fields.insert("company".into(), json!(ancestry.company));
    fields.insert("category".into(), json!(ancestry.category));
    fields.insert("subcategory".into(), json!(ancestry.subcategory));
    fields.insert("incentive".into(), json!(input.incentive));
    fields
}

fn check_amount(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::invalid_price(format!(
            "{} must be a non-negative number, got {}",
            field, value
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Reject negative or non-finite amounts before anything is written
pub fn validate_amounts(price: Option<f64>, min_price: Option<f64>, incentive: Option<f64>) -> AppResult<()> {
    if let Some(price) = price {
        check_amount("price", price)?;
    }
    if let Some(min_price) = min_price {
        check_amount("minPrice", min_price)?;
    }
    if let Some(incentive) = incentive
        && !incentive.is_finite()
    {
        return Err(AppError::validation("incentive must be a finite number")
            .with_detail("field", "incentive"));
    }
    Ok(())
}

pub fn validate_input(input: &ProductInput) -> AppResult<()> {
    validate_amounts(Some(input.price), Some(input.min_price), Some(input.incentive))
}
