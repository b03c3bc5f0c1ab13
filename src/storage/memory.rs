//! In-memory storage gateway. Backs the test suite and demo deployments;
//! implements the same contract as the Postgres gateway, including atomic
//! uniqueness under a single write lock.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::query::{Predicate, QueryDescriptor, SortDirection};

use super::{GatewayError, StorageGateway};

#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
    calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row without uniqueness checks (test fixtures).
    pub async fn seed(&self, table: &str, row: Map<String, Value>) {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row);
    }

    /// Number of gateway calls made so far. Tests use this to assert that
    /// validation and auth failures abort before any storage access.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn fetch_page(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Map<String, Value>>, GatewayError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let tables = self.tables.read().await;
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();

        let mut matched: Vec<&Map<String, Value>> = rows
            .iter()
            .filter(|row| query.predicates.iter().all(|p| p.matches(row)))
            .collect();

        matched.sort_by(|a, b| {
            let left = a.get(&query.sort.field).unwrap_or(&Value::Null);
            let right = b.get(&query.sort.field).unwrap_or(&Value::Null);
            let ordering = compare_values(left, right);
            match query.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(matched
            .into_iter()
            .skip(query.skip.max(0) as usize)
            .take(query.take.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, table: &str, predicates: &[Predicate]) -> Result<i64, GatewayError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let tables = self.tables.read().await;
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();
        Ok(rows.iter().filter(|row| predicates.iter().all(|p| p.matches(row))).count() as i64)
    }

    async fn insert_unique(
        &self,
        table: &str,
        row: Map<String, Value>,
        unique_columns: &[&str],
    ) -> Result<Map<String, Value>, GatewayError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        // Check and insert under one write lock; concurrent duplicates
        // serialize here instead of both succeeding.
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let duplicate = rows.iter().any(|existing| {
            unique_columns
                .iter()
                .all(|col| existing.get(*col).unwrap_or(&Value::Null) == row.get(*col).unwrap_or(&Value::Null))
        });
        if duplicate {
            return Err(GatewayError::Conflict(format!(
                "record already exists for ({})",
                unique_columns.join(", ")
            )));
        }
        rows.push(row.clone());
        Ok(row)
    }
}

/// Total order over raw JSON cells for sorting: nulls first, then by kind.
/// RFC 3339 strings sort lexicographically in chronological order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
