//! JSON ↔ typed value encoding used by the REST protocol
//!
//! The REST API wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "LG"}` or `{"integerValue": "42"}`.

use serde_json::{Map, Number, Value, json};

use crate::document::Fields;
use crate::error::{StoreError, StoreResult};

/// Encode a plain JSON value
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n.as_f64() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode a document's top-level fields
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode(value)))
            .collect(),
    )
}

/// Decode a typed value into plain JSON
pub fn decode(value: &Value) -> StoreResult<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::InvalidResponse(format!("expected typed value, got {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::InvalidResponse("empty typed value".to_string()))?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|n| Value::Number(n.into()))
                .ok_or_else(|| StoreError::InvalidResponse(format!("bad integerValue {}", inner)))?
        }
        // NaN / Infinity arrive as strings and have no JSON form
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
        other => {
            return Err(StoreError::InvalidResponse(format!(
                "unknown value type {}",
                other
            )));
        }
    };
    Ok(decoded)
}

/// Decode the `fields` object of a document; absent means no fields
pub fn decode_fields(fields: Option<&Value>) -> StoreResult<Fields> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let obj = fields
        .as_object()
        .ok_or_else(|| StoreError::InvalidResponse("fields is not an object".to_string()))?;
    obj.iter()
        .map(|(key, value)| Ok((key.clone(), decode(value)?)))
        .collect()
}

/// Quote a field name for use in an update mask
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!("LG")), json!({ "stringValue": "LG" }));
        assert_eq!(encode(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode(&json!(12.5)), json!({ "doubleValue": 12.5 }));
        assert_eq!(encode(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode(&Value::Null), json!({ "nullValue": null }));
    }

    #[test]
    fn test_decode_document_fields() {
        let raw = json!({
            "productName": { "stringValue": "OLED 55" },
            "price": { "integerValue": "1000" },
            "bottomPrice": { "doubleValue": 799.5 },
            "tags": { "arrayValue": { "values": [ { "stringValue": "tv" } ] } },
            "meta": { "mapValue": { "fields": { "rating": { "integerValue": "4" } } } },
            "empty": { "arrayValue": {} },
            "createdAt": { "timestampValue": "2024-01-01T00:00:00Z" }
        });
        let fields = decode_fields(Some(&raw)).unwrap();
        assert_eq!(fields["productName"], json!("OLED 55"));
        assert_eq!(fields["price"], json!(1000));
        assert_eq!(fields["bottomPrice"], json!(799.5));
        assert_eq!(fields["tags"], json!(["tv"]));
        assert_eq!(fields["meta"], json!({ "rating": 4 }));
        assert_eq!(fields["empty"], json!([]));
        assert_eq!(fields["createdAt"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(decode(&json!({ "mysteryValue": 1 })).is_err());
        assert!(decode(&json!("plain")).is_err());
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("bottomPrice"), "bottomPrice");
        assert_eq!(field_path("unit price"), "`unit price`");
        assert_eq!(field_path("9lives"), "`9lives`");
        assert_eq!(field_path("a`b"), "`a\\`b`");
    }
}
