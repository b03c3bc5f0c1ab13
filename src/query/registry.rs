use std::collections::HashMap;

use serde_json::{Map, Value};

use super::error::QueryError;
use super::spec::FilterSpecification;

/// Projects a raw storage row into the resource's public summary shape.
pub type RowMapper = fn(&Map<String, Value>) -> Result<Value, QueryError>;

/// One registered resource: its specification, storage table, and projection.
pub struct ResourceBinding {
    pub resource: &'static str,
    pub table: &'static str,
    pub spec: FilterSpecification,
    pub map_row: RowMapper,
}

/// Startup-time registry of resource bindings. Registered once, read-only
/// afterwards; concurrent reads need no locking.
#[derive(Default)]
pub struct SpecRegistry {
    bindings: HashMap<&'static str, ResourceBinding>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: ResourceBinding) {
        let existing = self.bindings.insert(binding.resource, binding);
        if let Some(prev) = existing {
            panic!("resource '{}' registered twice", prev.resource);
        }
    }

    /// Missing resources are a deploy-time defect, never a request-time
    /// condition; the error surfaces as a 500, not a 404.
    pub fn get(&self, resource: &str) -> Result<&ResourceBinding, QueryError> {
        self.bindings
            .get(resource)
            .ok_or_else(|| QueryError::Configuration(format!("resource '{}' is not registered", resource)))
    }

    pub fn resources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.keys().copied()
    }
}
