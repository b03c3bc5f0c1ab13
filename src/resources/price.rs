use serde_json::{Map, Value};

use crate::query::{
    FieldKind, FilterSpecification, QueryError, ResourceBinding, SortDirection, SortSpec, ValueType,
};

use super::{optional_string, require_bool, require_i64, require_string, require_timestamp};

pub fn binding() -> Result<ResourceBinding, QueryError> {
    Ok(ResourceBinding {
        resource: "ingredient_prices",
        table: "ingredient_prices",
        spec: spec()?,
        map_row,
    })
}

/// Prices are store-scoped: the store is the tenancy boundary, so the store
/// column doubles as the organization column. Prices are in integer minor
/// units.
fn spec() -> Result<FilterSpecification, QueryError> {
    FilterSpecification::builder(SortSpec::new("price", SortDirection::Asc))
        .filter("store_id", FieldKind::ForeignKey, "store_id", ValueType::Id)
        .filter("ingredient_id", FieldKind::ForeignKey, "ingredient_id", ValueType::Id)
        .filter("available", FieldKind::Exact, "available", ValueType::Boolean)
        .filter("min_price", FieldKind::RangeLow, "price", ValueType::Integer)
        .filter("max_price", FieldKind::RangeHigh, "price", ValueType::Integer)
        .filter("note", FieldKind::Substring, "note", ValueType::Text)
        .sortable(&["price", "updated_at"])
        .limits(20, 100)
        .pages_when_empty(1)
        .organization_column("store_id")
        .owner_column("created_by")
        .soft_delete_column("deleted_at")
        .build()
}

fn map_row(row: &Map<String, Value>) -> Result<Value, QueryError> {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(require_string(row, "id")?));
    out.insert("store_id".to_string(), Value::String(require_string(row, "store_id")?));
    out.insert("ingredient_id".to_string(), Value::String(require_string(row, "ingredient_id")?));
    out.insert("price".to_string(), Value::from(require_i64(row, "price")?));
    out.insert("available".to_string(), Value::Bool(require_bool(row, "available")?));
    out.insert("created_at".to_string(), Value::String(require_timestamp(row, "created_at")?));
    out.insert("updated_at".to_string(), Value::String(require_timestamp(row, "updated_at")?));
    if let Some(note) = optional_string(row, "note")? {
        out.insert("note".to_string(), Value::String(note));
    }
    Ok(Value::Object(out))
}
