use std::collections::HashSet;

use uuid::Uuid;

use super::error::QueryError;
use super::spec::FilterSpecification;
use super::types::{FieldValue, Operator, Predicate};

pub const ROLE_PLATFORM_ADMIN: &str = "platform_admin";
pub const ROLE_ORG_ADMIN: &str = "org_admin";
pub const ROLE_DEPT_MANAGER: &str = "dept_manager";
pub const ROLE_STAFF: &str = "staff";

/// The authenticated identity as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: String,
    pub organization_ids: Vec<Uuid>,
    pub department_ids: Vec<Uuid>,
}

/// Per-request scope, derived solely from the principal. Request content
/// never feeds into this, so a malicious filter value cannot widen access.
#[derive(Debug, Clone)]
pub struct ScopeContext {
    pub principal_id: Uuid,
    pub role: String,
    pub organization_ids: HashSet<Uuid>,
    pub department_ids: HashSet<Uuid>,
    pub is_platform_admin: bool,
}

impl ScopeContext {
    pub fn can_include_archived(&self) -> bool {
        self.is_platform_admin || self.role == ROLE_ORG_ADMIN
    }
}

/// Derive the scope context. Callers must authenticate before reaching
/// search; an absent or degenerate principal is an authentication failure,
/// not an authorization one.
pub fn resolve(principal: Option<&Principal>) -> Result<ScopeContext, QueryError> {
    let principal = principal.ok_or_else(|| QueryError::Authentication("no authenticated principal".to_string()))?;
    if principal.id.is_nil() {
        return Err(QueryError::Authentication("principal id is missing".to_string()));
    }
    if principal.role.is_empty() {
        return Err(QueryError::Authentication("principal role is missing".to_string()));
    }
    Ok(ScopeContext {
        principal_id: principal.id,
        role: principal.role.clone(),
        organization_ids: principal.organization_ids.iter().copied().collect(),
        department_ids: principal.department_ids.iter().copied().collect(),
        is_platform_admin: principal.role == ROLE_PLATFORM_ADMIN,
    })
}

/// Map the caller's role to the scoping predicates for one resource.
///
/// Total over the known role set: platform admins get an empty list
/// (unrestricted), every other known role gets at least one predicate, and
/// an unrecognized role fails closed instead of defaulting to unrestricted.
pub fn scope_predicates(ctx: &ScopeContext, spec: &FilterSpecification) -> Result<Vec<Predicate>, QueryError> {
    match ctx.role.as_str() {
        ROLE_PLATFORM_ADMIN => Ok(vec![]),
        ROLE_ORG_ADMIN => Ok(vec![organization_predicate(ctx, spec)?]),
        ROLE_DEPT_MANAGER => Ok(vec![
            organization_predicate(ctx, spec)?,
            membership_predicate(
                spec.department_column.as_deref(),
                &ctx.department_ids,
                "department-scoped role on a resource without a department column",
            )?,
        ]),
        ROLE_STAFF => {
            let owner_column = spec.owner_column.as_deref().ok_or_else(|| {
                QueryError::Configuration("owner-scoped role on a resource without an owner column".to_string())
            })?;
            Ok(vec![
                organization_predicate(ctx, spec)?,
                Predicate::new(owner_column, Operator::Eq, FieldValue::Id(ctx.principal_id)),
            ])
        }
        other => Err(QueryError::Authorization(format!("unrecognized role '{}'", other))),
    }
}

fn organization_predicate(ctx: &ScopeContext, spec: &FilterSpecification) -> Result<Predicate, QueryError> {
    membership_predicate(
        spec.organization_column.as_deref(),
        &ctx.organization_ids,
        "organization-scoped role on a resource without an organization column",
    )
}

/// An empty membership set matches nothing; never widens to unrestricted.
fn membership_predicate(
    column: Option<&str>,
    ids: &HashSet<Uuid>,
    missing_column: &str,
) -> Result<Predicate, QueryError> {
    let column = column.ok_or_else(|| QueryError::Configuration(missing_column.to_string()))?;
    let mut sorted: Vec<Uuid> = ids.iter().copied().collect();
    sorted.sort();
    Ok(Predicate::new(
        column,
        Operator::In,
        FieldValue::List(sorted.into_iter().map(FieldValue::Id).collect()),
    ))
}
