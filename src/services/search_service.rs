//! Pipeline orchestration: validate -> resolve scope -> compose -> storage
//! -> map -> envelope. Validation and auth failures abort before any
//! storage call; storage failures surface as dependency errors, unretried.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::query::{
    compose, scope, validate, FieldValue, Operator, PageMetadata, PagedResult, Predicate, Principal,
    QueryDescriptor, QueryError, RawRequest, ScopeContext, SpecRegistry,
};
use crate::storage::StorageGateway;

#[derive(Clone)]
pub struct SearchService {
    registry: &'static SpecRegistry,
    gateway: Arc<dyn StorageGateway>,
}

impl SearchService {
    pub fn new(registry: &'static SpecRegistry, gateway: Arc<dyn StorageGateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn gateway(&self) -> Arc<dyn StorageGateway> {
        self.gateway.clone()
    }

    pub fn registry(&self) -> &'static SpecRegistry {
        self.registry
    }

    /// Scoped, filtered, paginated search over one registered resource.
    pub async fn search(
        &self,
        resource: &str,
        raw: &RawRequest,
        principal: Option<&Principal>,
    ) -> Result<PagedResult<Value>, QueryError> {
        let binding = self.registry.get(resource)?;
        let ctx = scope::resolve(principal)?;
        let validated = validate(raw, &binding.spec)?;
        let scope_predicates = scope::scope_predicates(&ctx, &binding.spec)?;
        let containment_check = scope_predicates.clone();

        let page = validated.page;
        let limit = validated.limit;
        let descriptor = compose(validated, scope_predicates, &binding.spec, ctx.can_include_archived());

        // No lock spans these two calls; under concurrent writes the total
        // and the page may momentarily disagree.
        let records = self.gateway.count(binding.table, &descriptor.predicates).await?;
        let rows = self.gateway.fetch_page(binding.table, &descriptor).await?;

        verify_scope_containment(&rows, &containment_check, &ctx)?;

        let data = rows.iter().map(binding.map_row).collect::<Result<Vec<Value>, QueryError>>()?;
        let pagination = PageMetadata::compute(page, limit, records, binding.spec.pages_when_empty);
        Ok(PagedResult::assemble(pagination, data))
    }

    /// Single-entity lookup. A record that exists outside the caller's scope
    /// reads as absent: the composed query carries the scope predicates, so
    /// the response is NotFound either way and never confirms existence.
    pub async fn get_by_id(
        &self,
        resource: &str,
        id: Uuid,
        principal: Option<&Principal>,
    ) -> Result<Value, QueryError> {
        let binding = self.registry.get(resource)?;
        let ctx = scope::resolve(principal)?;

        let mut predicates = vec![Predicate::new("id", Operator::Eq, FieldValue::Id(id))];
        predicates.extend(scope::scope_predicates(&ctx, &binding.spec)?);
        if let Some(column) = &binding.spec.soft_delete_column {
            predicates.push(Predicate::new(column, Operator::IsNull, FieldValue::Null));
        }

        let descriptor = QueryDescriptor {
            predicates,
            sort: binding.spec.default_sort.clone(),
            skip: 0,
            take: 1,
            exclude_archived: true,
        };
        let rows = self.gateway.fetch_page(binding.table, &descriptor).await?;
        let row = rows
            .first()
            .ok_or_else(|| QueryError::NotFound(format!("{} record not found", resource)))?;
        (binding.map_row)(row)
    }
}

/// Defense-in-depth: re-check every fetched raw row against the scope
/// predicates. A violation here means the composed query was bypassed or
/// mis-rendered, which is a cross-scope defect, not a missing record.
fn verify_scope_containment(
    rows: &[Map<String, Value>],
    scope_predicates: &[Predicate],
    ctx: &ScopeContext,
) -> Result<(), QueryError> {
    for row in rows {
        if !scope_predicates.iter().all(|p| p.matches(row)) {
            tracing::error!(principal = %ctx.principal_id, role = %ctx.role, "fetched row escapes caller scope");
            return Err(QueryError::Authorization("result outside caller scope".to_string()));
        }
    }
    Ok(())
}
