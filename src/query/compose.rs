use super::spec::FilterSpecification;
use super::types::{FieldValue, Operator, Predicate, SortSpec};
use super::validate::ValidatedQuery;

/// Fully composed, storage-agnostic description of what to fetch. Immutable
/// once handed to the gateway.
#[derive(Debug)]
pub struct QueryDescriptor {
    pub predicates: Vec<Predicate>,
    pub sort: SortSpec,
    pub skip: i64,
    pub take: i64,
    pub exclude_archived: bool,
}

/// Merge request predicates with the caller's scope predicates and the
/// soft-delete exclusion.
///
/// Scope predicates are always appended; nothing in the request can remove
/// or override them. The archived opt-out is honored only when the caller's
/// scope allows it (the flag itself is scope-checked), otherwise it is
/// ignored and the exclusion stays.
pub fn compose(
    validated: ValidatedQuery,
    scope_predicates: Vec<Predicate>,
    spec: &FilterSpecification,
    archived_allowed: bool,
) -> QueryDescriptor {
    let exclude_archived = !(validated.include_archived && archived_allowed);

    let mut predicates = validated.predicates;
    predicates.extend(scope_predicates);
    if exclude_archived {
        if let Some(column) = &spec.soft_delete_column {
            predicates.push(Predicate::new(column, Operator::IsNull, FieldValue::Null));
        }
    }

    QueryDescriptor {
        predicates,
        sort: validated.sort,
        skip: validated.skip,
        take: validated.take,
        exclude_archived,
    }
}
