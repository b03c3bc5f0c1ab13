//! Resource bindings: the per-resource filter specifications and row
//! projections that parameterize the shared query engine.

pub mod appointment;
pub mod price;
pub mod waitlist;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::query::{QueryError, SpecRegistry};

/// Process-wide registry. Registration failures are deploy-time defects and
/// abort startup rather than surfacing per request.
static REGISTRY: Lazy<SpecRegistry> = Lazy::new(|| {
    let mut registry = SpecRegistry::new();
    registry.register(appointment::binding().expect("appointments registration"));
    registry.register(price::binding().expect("ingredient_prices registration"));
    registry.register(waitlist::binding().expect("waitlist_entries registration"));
    registry
});

pub fn registry() -> &'static SpecRegistry {
    &REGISTRY
}

// Row projection helpers. Each is total: a malformed cell is a Mapping
// error (gateway contract drift), a null in a nullable field becomes an
// absent field.

fn mapping(key: &str, expected: &str) -> QueryError {
    QueryError::Mapping(format!("column '{}' is missing or not a {}", key, expected))
}

pub(crate) fn require_string(row: &Map<String, Value>, key: &str) -> Result<String, QueryError> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| mapping(key, "string"))
}

pub(crate) fn require_i64(row: &Map<String, Value>, key: &str) -> Result<i64, QueryError> {
    row.get(key).and_then(Value::as_i64).ok_or_else(|| mapping(key, "number"))
}

pub(crate) fn require_bool(row: &Map<String, Value>, key: &str) -> Result<bool, QueryError> {
    row.get(key).and_then(Value::as_bool).ok_or_else(|| mapping(key, "boolean"))
}

pub(crate) fn optional_string(row: &Map<String, Value>, key: &str) -> Result<Option<String>, QueryError> {
    match row.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(mapping(key, "string")),
    }
}

/// Normalize a storage timestamp to the canonical RFC 3339 form.
pub(crate) fn require_timestamp(row: &Map<String, Value>, key: &str) -> Result<String, QueryError> {
    let raw = require_string(row, key)?;
    let ts: DateTime<Utc> = raw
        .parse::<DateTime<Utc>>()
        .map_err(|_| mapping(key, "timestamp"))?;
    Ok(ts.to_rfc3339())
}

pub(crate) fn optional_timestamp(row: &Map<String, Value>, key: &str) -> Result<Option<String>, QueryError> {
    match optional_string(row, key)? {
        None => Ok(None),
        Some(raw) => {
            let ts: DateTime<Utc> = raw.parse::<DateTime<Utc>>().map_err(|_| mapping(key, "timestamp"))?;
            Ok(Some(ts.to_rfc3339()))
        }
    }
}
