use serde_json::{Map, Value};

use crate::query::{
    FieldKind, FilterSpecification, QueryError, ResourceBinding, SortDirection, SortSpec, ValueType,
};

use super::{require_string, require_timestamp};

/// Columns that make a waitlist entry unique: a patient may appear at most
/// once on a given appointment's waitlist. Enforced atomically by the
/// storage gateway, never by a check-then-insert above it.
pub const UNIQUE_COLUMNS: &[&str] = &["appointment_id", "patient_id"];

pub fn binding() -> Result<ResourceBinding, QueryError> {
    Ok(ResourceBinding {
        resource: "waitlist_entries",
        table: "waitlist_entries",
        spec: spec()?,
        map_row,
    })
}

/// Waitlist entries are hard-deleted, so this resource opts out of the
/// soft-delete exclusion by not declaring a column for it.
fn spec() -> Result<FilterSpecification, QueryError> {
    FilterSpecification::builder(SortSpec::new("created_at", SortDirection::Asc))
        .filter("appointment_id", FieldKind::ForeignKey, "appointment_id", ValueType::Id)
        .filter("patient_id", FieldKind::ForeignKey, "patient_id", ValueType::Id)
        .sortable(&["created_at"])
        .limits(50, 200)
        .pages_when_empty(0)
        .organization_column("organization_id")
        .owner_column("created_by")
        .build()
}

fn map_row(row: &Map<String, Value>) -> Result<Value, QueryError> {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(require_string(row, "id")?));
    out.insert("appointment_id".to_string(), Value::String(require_string(row, "appointment_id")?));
    out.insert("patient_id".to_string(), Value::String(require_string(row, "patient_id")?));
    out.insert("organization_id".to_string(), Value::String(require_string(row, "organization_id")?));
    out.insert("created_at".to_string(), Value::String(require_timestamp(row, "created_at")?));
    Ok(Value::Object(out))
}
