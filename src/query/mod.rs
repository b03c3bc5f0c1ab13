pub mod compose;
pub mod error;
pub mod page;
pub mod registry;
pub mod scope;
pub mod spec;
pub mod types;
pub mod validate;

pub use compose::{compose, QueryDescriptor};
pub use error::QueryError;
pub use page::{PageMetadata, PagedResult};
pub use registry::{ResourceBinding, RowMapper, SpecRegistry};
pub use scope::{resolve, scope_predicates, Principal, ScopeContext};
pub use spec::{FieldKind, FilterFieldSpec, FilterSpecification};
pub use types::{FieldValue, Operator, Predicate, SortDirection, SortSpec, ValueType};
pub use validate::{validate, RawRequest, ValidatedQuery};
