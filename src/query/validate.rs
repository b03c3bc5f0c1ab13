use std::collections::BTreeMap;

use super::error::QueryError;
use super::spec::{FieldKind, FilterSpecification};
use super::types::{FieldValue, Operator, Predicate, SortDirection, SortSpec};

/// Untrusted search request: the raw query-string parameters. Pagination,
/// sort and filter fields all arrive as strings and are coerced here.
#[derive(Debug, Clone, Default)]
pub struct RawRequest(BTreeMap<String, String>);

impl RawRequest {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self(params)
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }
}

/// Output of validation: typed predicates plus computed pagination. The
/// predicate list is owned here and moves into the QueryDescriptor.
#[derive(Debug)]
pub struct ValidatedQuery {
    pub predicates: Vec<Predicate>,
    pub sort: SortSpec,
    pub page: i64,
    pub limit: i64,
    pub skip: i64,
    pub take: i64,
    pub include_archived: bool,
}

/// Validate a raw request against a resource specification.
///
/// Pagination mistakes are rejected, not clamped. Unknown sort fields and
/// unknown filter parameters are tolerated (forward-compatible clients), but
/// known fields with invalid values always fail.
pub fn validate(raw: &RawRequest, spec: &FilterSpecification) -> Result<ValidatedQuery, QueryError> {
    let page = parse_int(raw.get("page"), "page", 1)?;
    if page < 1 {
        return Err(QueryError::validation("'page' must be >= 1"));
    }

    let limit = parse_int(raw.get("limit"), "limit", spec.default_limit)?;
    if limit < 1 {
        return Err(QueryError::validation("'limit' must be >= 1"));
    }
    if limit > spec.max_limit {
        return Err(QueryError::validation(format!("'limit' must be <= {}", spec.max_limit)));
    }

    let sort = resolve_sort(raw, spec);
    let include_archived = matches!(raw.get("include_archived"), Some("true") | Some("1"));

    let mut predicates = Vec::new();
    for field in &spec.fields {
        let Some(value) = raw.get(&field.name) else { continue };
        if field.kind == FieldKind::Substring && value.is_empty() {
            continue;
        }
        let typed = field.value_type.coerce(&field.name, value)?;
        let predicate = match field.kind {
            FieldKind::Exact | FieldKind::EnumSet => {
                if let Some(allowed) = &field.allowed_values {
                    if !allowed.contains(&typed) {
                        return Err(QueryError::validation(format!("'{}' must be one of the allowed values", field.name)));
                    }
                }
                Predicate::new(&field.column, Operator::Eq, typed)
            }
            FieldKind::RangeLow => Predicate::new(&field.column, Operator::Gte, typed),
            FieldKind::RangeHigh => Predicate::new(&field.column, Operator::Lte, typed),
            FieldKind::Substring => Predicate::new(&field.column, Operator::Contains, typed),
            FieldKind::ForeignKey => Predicate::new(&field.column, Operator::Eq, typed),
        };
        predicates.push(predicate);
    }

    check_range_pairs(&predicates)?;

    Ok(ValidatedQuery {
        predicates,
        sort,
        page,
        limit,
        skip: (page - 1) * limit,
        take: limit,
        include_archived,
    })
}

fn parse_int(raw: Option<&str>, field: &str, default: i64) -> Result<i64, QueryError> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| QueryError::validation(format!("'{}' must be an integer", field))),
    }
}

fn resolve_sort(raw: &RawRequest, spec: &FilterSpecification) -> SortSpec {
    let direction = match raw.get("order").map(str::to_ascii_lowercase).as_deref() {
        Some("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    match raw.get("sort") {
        Some(field) if spec.sortable_fields.contains(field) => SortSpec::new(field, direction),
        _ => spec.default_sort.clone(),
    }
}

/// A supplied low bound greater than a supplied high bound on the same
/// column can never match anything the caller intended; reject it.
fn check_range_pairs(predicates: &[Predicate]) -> Result<(), QueryError> {
    for low in predicates.iter().filter(|p| p.operator == Operator::Gte) {
        for high in predicates.iter().filter(|p| p.operator == Operator::Lte && p.column == low.column) {
            if matches!(low.value.compare(&high.value), Some(std::cmp::Ordering::Greater)) {
                return Err(QueryError::validation(format!(
                    "range bounds for '{}' are inverted",
                    low.column
                )));
            }
        }
    }
    Ok(())
}
