use serde_json::{Map, Value};

use crate::query::{
    FieldKind, FilterSpecification, QueryError, ResourceBinding, SortDirection, SortSpec, ValueType,
};

use super::{optional_string, optional_timestamp, require_string, require_timestamp};

pub const STATUSES: &[&str] = &["requested", "booked", "completed", "cancelled"];

pub fn binding() -> Result<ResourceBinding, QueryError> {
    Ok(ResourceBinding {
        resource: "appointments",
        table: "appointments",
        spec: spec()?,
        map_row,
    })
}

fn spec() -> Result<FilterSpecification, QueryError> {
    FilterSpecification::builder(SortSpec::new("starts_at", SortDirection::Asc))
        .enum_filter("status", "status", STATUSES)
        .filter("practitioner_id", FieldKind::ForeignKey, "practitioner_id", ValueType::Id)
        .filter("patient_id", FieldKind::ForeignKey, "patient_id", ValueType::Id)
        .filter("starts_from", FieldKind::RangeLow, "starts_at", ValueType::Timestamp)
        .filter("starts_to", FieldKind::RangeHigh, "starts_at", ValueType::Timestamp)
        .filter("reason", FieldKind::Substring, "reason", ValueType::Text)
        .sortable(&["starts_at", "created_at", "status"])
        .limits(25, 100)
        .pages_when_empty(0)
        .organization_column("organization_id")
        .department_column("department_id")
        .owner_column("practitioner_id")
        .soft_delete_column("deleted_at")
        .build()
}

/// Public summary projection. Internal columns (soft-delete marker) are
/// dropped; nullable columns become absent fields.
fn map_row(row: &Map<String, Value>) -> Result<Value, QueryError> {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(require_string(row, "id")?));
    out.insert("status".to_string(), Value::String(require_string(row, "status")?));
    out.insert("starts_at".to_string(), Value::String(require_timestamp(row, "starts_at")?));
    out.insert("patient_id".to_string(), Value::String(require_string(row, "patient_id")?));
    out.insert("practitioner_id".to_string(), Value::String(require_string(row, "practitioner_id")?));
    out.insert("organization_id".to_string(), Value::String(require_string(row, "organization_id")?));
    out.insert("created_at".to_string(), Value::String(require_timestamp(row, "created_at")?));
    out.insert("updated_at".to_string(), Value::String(require_timestamp(row, "updated_at")?));
    if let Some(reason) = optional_string(row, "reason")? {
        out.insert("reason".to_string(), Value::String(reason));
    }
    if let Some(ends_at) = optional_timestamp(row, "ends_at")? {
        out.insert("ends_at".to_string(), Value::String(ends_at));
    }
    if let Some(department_id) = optional_string(row, "department_id")? {
        out.insert("department_id".to_string(), Value::String(department_id));
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row() -> Map<String, Value> {
        json!({
            "id": "5f2e7e3e-1111-4e2a-9c60-000000000001",
            "status": "booked",
            "reason": "Annual checkup",
            "starts_at": "2026-03-01T10:00:00+00:00",
            "ends_at": null,
            "patient_id": "5f2e7e3e-1111-4e2a-9c60-000000000002",
            "practitioner_id": "5f2e7e3e-1111-4e2a-9c60-000000000003",
            "organization_id": "5f2e7e3e-1111-4e2a-9c60-000000000004",
            "department_id": null,
            "deleted_at": null,
            "created_at": "2026-02-01T09:00:00+00:00",
            "updated_at": "2026-02-01T09:00:00+00:00",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn nullable_columns_become_absent_fields() {
        let mapped = map_row(&raw_row()).unwrap();
        assert_eq!(mapped["reason"], json!("Annual checkup"));
        assert!(mapped.get("ends_at").is_none());
        assert!(mapped.get("department_id").is_none());
    }

    #[test]
    fn internal_columns_are_dropped() {
        let mapped = map_row(&raw_row()).unwrap();
        assert!(mapped.get("deleted_at").is_none());
    }

    #[test]
    fn malformed_row_is_mapping_error() {
        let mut row = raw_row();
        row.insert("starts_at".to_string(), json!(12345));
        assert!(matches!(map_row(&row), Err(QueryError::Mapping(_))));

        let mut row = raw_row();
        row.remove("status");
        assert!(matches!(map_row(&row), Err(QueryError::Mapping(_))));
    }
}
