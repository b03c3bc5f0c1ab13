use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::QueryError;

/// Wire-level value type of a filter parameter. Drives coercion from the
/// untrusted string form into a typed [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Id,
}

impl ValueType {
    /// Coerce a raw request string into a typed value, or reject it.
    pub fn coerce(&self, field: &str, raw: &str) -> Result<FieldValue, QueryError> {
        match self {
            ValueType::Text => Ok(FieldValue::Text(raw.to_string())),
            ValueType::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| QueryError::validation(format!("'{}' must be an integer", field))),
            ValueType::Decimal => raw
                .parse::<f64>()
                .map(FieldValue::Decimal)
                .map_err(|_| QueryError::validation(format!("'{}' must be a number", field))),
            ValueType::Boolean => match raw {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(QueryError::validation(format!("'{}' must be true or false", field))),
            },
            ValueType::Timestamp => parse_timestamp(raw)
                .map(FieldValue::Timestamp)
                .ok_or_else(|| QueryError::validation(format!("'{}' must be an RFC 3339 timestamp or date", field))),
            ValueType::Id => Uuid::parse_str(raw)
                .map(FieldValue::Id)
                .map_err(|_| QueryError::validation(format!("'{}' must be a UUID", field))),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Plain dates are accepted as midnight UTC
    let date = raw.parse::<NaiveDate>().ok()?;
    Some(DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0)?, Utc))
}

/// Typed predicate value. Ordered comparison is only defined between
/// same-kind numeric or timestamp values.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Decimal(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Decimal(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Compare against a raw storage JSON value, using this value's type as
    /// the interpretation of the JSON side.
    pub fn compare_json(&self, json: &Value) -> Option<Ordering> {
        self.compare(&Self::from_json(json, self)?)
    }

    /// Equality against a raw storage JSON value.
    pub fn matches_json(&self, json: &Value) -> bool {
        match Self::from_json(json, self) {
            Some(v) => v == *self,
            None => false,
        }
    }

    fn from_json(json: &Value, like: &FieldValue) -> Option<FieldValue> {
        match (like, json) {
            (FieldValue::Text(_), Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (FieldValue::Integer(_), Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
            (FieldValue::Decimal(_), Value::Number(n)) => n.as_f64().map(FieldValue::Decimal),
            (FieldValue::Boolean(_), Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (FieldValue::Timestamp(_), Value::String(s)) => parse_timestamp(s).map(FieldValue::Timestamp),
            (FieldValue::Id(_), Value::String(s)) => Uuid::parse_str(s).ok().map(FieldValue::Id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gte,
    Lte,
    Contains,
    In,
    IsNull,
}

/// One atomic filter condition, ANDed into a query.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: FieldValue,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: FieldValue) -> Self {
        Self { column: column.into(), operator, value }
    }

    /// Evaluate this predicate against a raw storage row. Shared by the
    /// in-memory gateway and the post-fetch scope double-check.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        let cell = row.get(&self.column).unwrap_or(&Value::Null);
        match self.operator {
            Operator::Eq => self.value.matches_json(cell),
            Operator::Ne => !cell.is_null() && !self.value.matches_json(cell),
            Operator::Gte => matches!(self.value.compare_json(cell), Some(Ordering::Less | Ordering::Equal)),
            Operator::Lte => matches!(self.value.compare_json(cell), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Contains => match (&self.value, cell) {
                (FieldValue::Text(needle), Value::String(hay)) => hay.contains(needle.as_str()),
                _ => false,
            },
            Operator::In => match &self.value {
                FieldValue::List(values) => values.iter().any(|v| v.matches_json(cell)),
                _ => false,
            },
            Operator::IsNull => cell.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: Value) -> Map<String, Value> {
        pairs.as_object().cloned().unwrap()
    }

    #[test]
    fn coerce_rejects_bad_integer() {
        assert!(ValueType::Integer.coerce("limit", "abc").is_err());
        assert_eq!(ValueType::Integer.coerce("limit", "25").unwrap(), FieldValue::Integer(25));
    }

    #[test]
    fn coerce_accepts_plain_date_as_midnight() {
        match ValueType::Timestamp.coerce("starts_from", "2026-03-01").unwrap() {
            FieldValue::Timestamp(ts) => assert_eq!(ts.to_rfc3339(), "2026-03-01T00:00:00+00:00"),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn eq_predicate_matches_typed_json() {
        let p = Predicate::new("price", Operator::Eq, FieldValue::Integer(120));
        assert!(p.matches(&row(json!({"price": 120}))));
        assert!(!p.matches(&row(json!({"price": 121}))));
        assert!(!p.matches(&row(json!({"price": null}))));
    }

    #[test]
    fn range_predicates_compare_numbers_and_timestamps() {
        let gte = Predicate::new("price", Operator::Gte, FieldValue::Integer(100));
        let lte = Predicate::new("price", Operator::Lte, FieldValue::Integer(200));
        let r = row(json!({"price": 150}));
        assert!(gte.matches(&r) && lte.matches(&r));
        assert!(!gte.matches(&row(json!({"price": 99}))));

        let ts = ValueType::Timestamp.coerce("t", "2026-01-01T00:00:00Z").unwrap();
        let p = Predicate::new("starts_at", Operator::Gte, ts);
        assert!(p.matches(&row(json!({"starts_at": "2026-06-01T00:00:00Z"}))));
    }

    #[test]
    fn in_predicate_with_empty_list_matches_nothing() {
        let p = Predicate::new("store_id", Operator::In, FieldValue::List(vec![]));
        assert!(!p.matches(&row(json!({"store_id": "x"}))));
    }

    #[test]
    fn contains_is_case_preserving() {
        let p = Predicate::new("reason", Operator::Contains, FieldValue::Text("Check".into()));
        assert!(p.matches(&row(json!({"reason": "Annual Checkup"}))));
        assert!(!p.matches(&row(json!({"reason": "annual checkup"}))));
    }
}
