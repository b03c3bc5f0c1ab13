//! Postgres storage gateway: renders a QueryDescriptor into parameterized
//! SQL ($n placeholders, identifiers double-quoted) and decodes rows back
//! into JSON maps.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::{Column, Row};
use uuid::Uuid;

use async_trait::async_trait;

use crate::query::{FieldValue, Operator, Predicate, QueryDescriptor};

use super::{GatewayError, StorageGateway};

pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageGateway for PgGateway {
    async fn fetch_page(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Map<String, Value>>, GatewayError> {
        let (where_clause, params) = render_where(&query.predicates);
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE {} ORDER BY \"{}\" {} LIMIT {} OFFSET {}",
            table,
            where_clause,
            query.sort.field,
            query.sort.direction.as_sql(),
            query.take,
            query.skip,
        );
        if crate::config::config().database.enable_query_logging {
            tracing::debug!(table, %sql, "fetch_page");
        }

        let mut q = sqlx::query(&sql);
        for p in &params {
            q = bind_value(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn count(&self, table: &str, predicates: &[Predicate]) -> Result<i64, GatewayError> {
        let (where_clause, params) = render_where(predicates);
        let sql = format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", table, where_clause);

        let mut q = sqlx::query(&sql);
        for p in &params {
            q = bind_value(q, p);
        }
        let row = q.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        row.try_get("count").map_err(map_sqlx_error)
    }

    async fn insert_unique(
        &self,
        table: &str,
        row: Map<String, Value>,
        unique_columns: &[&str],
    ) -> Result<Map<String, Value>, GatewayError> {
        let columns: Vec<&String> = row.keys().collect();
        for column in columns.iter().map(|c| c.as_str()).chain(unique_columns.iter().copied()) {
            crate::query::spec::validate_identifier(column)
                .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        }
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING RETURNING *",
            table,
            columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", "),
            placeholders.join(", "),
            unique_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", "),
        );

        let mut q = sqlx::query(&sql);
        for column in &columns {
            q = bind_json(q, &row[column.as_str()]);
        }
        match q.fetch_optional(&self.pool).await.map_err(map_sqlx_error)? {
            Some(inserted) => Ok(row_to_map(&inserted)),
            None => Err(GatewayError::Conflict(format!(
                "record already exists for ({})",
                unique_columns.join(", ")
            ))),
        }
    }
}

/// Render predicates as one ANDed WHERE clause with $n placeholders. The
/// parameter list is returned alongside for binding.
fn render_where(predicates: &[Predicate]) -> (String, Vec<FieldValue>) {
    let mut params: Vec<FieldValue> = Vec::new();
    let mut conditions: Vec<String> = Vec::new();

    for p in predicates {
        let column = format!("\"{}\"", p.column);
        let condition = match p.operator {
            Operator::Eq => match &p.value {
                FieldValue::Null => format!("{} IS NULL", column),
                v => format!("{} = {}", column, push_param(&mut params, v.clone())),
            },
            Operator::Ne => match &p.value {
                FieldValue::Null => format!("{} IS NOT NULL", column),
                v => format!("{} <> {}", column, push_param(&mut params, v.clone())),
            },
            Operator::Gte => format!("{} >= {}", column, push_param(&mut params, p.value.clone())),
            Operator::Lte => format!("{} <= {}", column, push_param(&mut params, p.value.clone())),
            Operator::Contains => match &p.value {
                FieldValue::Text(needle) => {
                    let pattern = format!("%{}%", escape_like(needle));
                    format!("{} LIKE {}", column, push_param(&mut params, FieldValue::Text(pattern)))
                }
                _ => "1=0".to_string(),
            },
            Operator::In => match &p.value {
                FieldValue::List(values) if values.is_empty() => "1=0".to_string(),
                FieldValue::List(values) => {
                    let placeholders: Vec<String> =
                        values.iter().map(|v| push_param(&mut params, v.clone())).collect();
                    format!("{} IN ({})", column, placeholders.join(", "))
                }
                v => format!("{} = {}", column, push_param(&mut params, v.clone())),
            },
            Operator::IsNull => format!("{} IS NULL", column),
        };
        conditions.push(condition);
    }

    if conditions.is_empty() {
        ("1=1".to_string(), params)
    } else {
        (conditions.join(" AND "), params)
    }
}

fn push_param(params: &mut Vec<FieldValue>, value: FieldValue) -> String {
    params.push(value);
    format!("${}", params.len())
}

fn escape_like(needle: &str) -> String {
    needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q FieldValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FieldValue::Text(s) => q.bind(s),
        FieldValue::Integer(i) => q.bind(*i),
        FieldValue::Decimal(f) => q.bind(*f),
        FieldValue::Boolean(b) => q.bind(*b),
        FieldValue::Timestamp(ts) => q.bind(*ts),
        FieldValue::Id(id) => q.bind(*id),
        // Lists are expanded into individual placeholders before binding
        FieldValue::List(_) => q,
        FieldValue::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
    }
}

/// Bind a JSON value from an insert row, promoting strings that carry UUIDs
/// or timestamps to their native Postgres types.
fn bind_json<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                q.bind(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                q.bind(ts.with_timezone(&Utc))
            } else {
                q.bind(s)
            }
        }
        other => q.bind(other.clone()),
    }
}

fn row_to_map(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for i in 0..row.len() {
        let name = row.column(i).name().to_string();
        let value = decode_column(row, i);
        map.insert(name, value);
    }
    map
}

fn decode_column(row: &PgRow, i: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<Value>, _>(i) {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Uuid>, _>(i) {
        return v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(i) {
        return v.map(|ts| Value::String(ts.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    Value::Null
}

fn map_sqlx_error(err: sqlx::Error) -> GatewayError {
    match &err {
        sqlx::Error::PoolTimedOut => GatewayError::Timeout("connection pool timed out".to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            GatewayError::Conflict("unique constraint violated".to_string())
        }
        _ => {
            tracing::error!(error = %err, "postgres gateway failure");
            GatewayError::Unavailable(err.to_string())
        }
    }
}
