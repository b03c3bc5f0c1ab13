pub mod memory;
pub mod sql;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::query::{Predicate, QueryDescriptor, QueryError};

pub use memory::MemoryGateway;
pub use sql::PgGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("duplicate record: {0}")]
    Conflict(String),

    #[error("storage timeout: {0}")]
    Timeout(String),

    #[error("storage failure: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for QueryError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Conflict(msg) => QueryError::Conflict(msg),
            GatewayError::Timeout(msg) => QueryError::dependency(msg, true),
            GatewayError::Unavailable(msg) => QueryError::dependency(msg, false),
        }
    }
}

/// The storage engine boundary. The engine holds no locks across the
/// count/fetch pair, so the two may observe different snapshots under
/// concurrent writes; that momentary inconsistency is accepted. Uniqueness
/// invariants live here (`insert_unique`), never as a check-then-insert
/// above this trait.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Execute a composed query, returning raw rows as JSON maps.
    async fn fetch_page(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Map<String, Value>>, GatewayError>;

    /// Count all records matching the predicates, ignoring pagination.
    async fn count(&self, table: &str, predicates: &[Predicate]) -> Result<i64, GatewayError>;

    /// Atomic conditional insert: fails with [`GatewayError::Conflict`] when
    /// a record with the same values in `unique_columns` already exists.
    async fn insert_unique(
        &self,
        table: &str,
        row: Map<String, Value>,
        unique_columns: &[&str],
    ) -> Result<Map<String, Value>, GatewayError>;
}
