use std::collections::HashSet;

use super::error::QueryError;
use super::types::{FieldValue, SortDirection, SortSpec, ValueType};

/// How a filter parameter constrains its target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Exact,
    RangeLow,
    RangeHigh,
    Substring,
    EnumSet,
    ForeignKey,
}

/// Declarative description of one filterable parameter. `name` is the wire
/// parameter; `column` is the storage attribute it constrains, so a range
/// pair like `min_price`/`max_price` shares `column = "price"`.
#[derive(Debug, Clone)]
pub struct FilterFieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub column: String,
    pub value_type: ValueType,
    pub allowed_values: Option<Vec<FieldValue>>,
}

/// Per-resource whitelist of filterable and sortable fields, plus pagination
/// bounds and the scope/soft-delete column layout. Built once at
/// registration, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FilterSpecification {
    pub fields: Vec<FilterFieldSpec>,
    pub sortable_fields: HashSet<String>,
    pub default_sort: SortSpec,
    pub default_limit: i64,
    pub max_limit: i64,
    pub pages_when_empty: i64,
    pub organization_column: Option<String>,
    pub department_column: Option<String>,
    pub owner_column: Option<String>,
    pub soft_delete_column: Option<String>,
}

impl FilterSpecification {
    pub fn builder(default_sort: SortSpec) -> FilterSpecificationBuilder {
        FilterSpecificationBuilder {
            spec: FilterSpecification {
                fields: vec![],
                sortable_fields: HashSet::new(),
                default_sort,
                default_limit: 25,
                max_limit: 100,
                pages_when_empty: 0,
                organization_column: None,
                department_column: None,
                owner_column: None,
                soft_delete_column: None,
            },
        }
    }

    pub fn field(&self, name: &str) -> Option<&FilterFieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub struct FilterSpecificationBuilder {
    spec: FilterSpecification,
}

impl FilterSpecificationBuilder {
    pub fn filter(mut self, name: &str, kind: FieldKind, column: &str, value_type: ValueType) -> Self {
        self.spec.fields.push(FilterFieldSpec {
            name: name.to_string(),
            kind,
            column: column.to_string(),
            value_type,
            allowed_values: None,
        });
        self
    }

    pub fn enum_filter(mut self, name: &str, column: &str, allowed: &[&str]) -> Self {
        self.spec.fields.push(FilterFieldSpec {
            name: name.to_string(),
            kind: FieldKind::EnumSet,
            column: column.to_string(),
            value_type: ValueType::Text,
            allowed_values: Some(allowed.iter().map(|v| FieldValue::Text(v.to_string())).collect()),
        });
        self
    }

    pub fn sortable(mut self, fields: &[&str]) -> Self {
        for f in fields {
            self.spec.sortable_fields.insert(f.to_string());
        }
        self
    }

    pub fn limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.spec.default_limit = default_limit;
        self.spec.max_limit = max_limit;
        self
    }

    pub fn pages_when_empty(mut self, pages: i64) -> Self {
        self.spec.pages_when_empty = pages;
        self
    }

    pub fn organization_column(mut self, column: &str) -> Self {
        self.spec.organization_column = Some(column.to_string());
        self
    }

    pub fn department_column(mut self, column: &str) -> Self {
        self.spec.department_column = Some(column.to_string());
        self
    }

    pub fn owner_column(mut self, column: &str) -> Self {
        self.spec.owner_column = Some(column.to_string());
        self
    }

    pub fn soft_delete_column(mut self, column: &str) -> Self {
        self.spec.soft_delete_column = Some(column.to_string());
        self
    }

    /// Finish the specification, checking every referenced identifier. A bad
    /// identifier here is a registration defect, so this fails loud at
    /// startup rather than per request.
    pub fn build(self) -> Result<FilterSpecification, QueryError> {
        let spec = self.spec;
        for field in &spec.fields {
            validate_identifier(&field.column)?;
            match field.kind {
                FieldKind::RangeLow | FieldKind::RangeHigh => {
                    if !matches!(field.value_type, ValueType::Integer | ValueType::Decimal | ValueType::Timestamp) {
                        return Err(QueryError::Configuration(format!(
                            "range filter '{}' must be numeric or timestamp",
                            field.name
                        )));
                    }
                }
                FieldKind::Substring => {
                    if field.value_type != ValueType::Text {
                        return Err(QueryError::Configuration(format!(
                            "substring filter '{}' must be text",
                            field.name
                        )));
                    }
                }
                FieldKind::ForeignKey => {
                    if field.value_type != ValueType::Id {
                        return Err(QueryError::Configuration(format!(
                            "foreign key filter '{}' must be an id",
                            field.name
                        )));
                    }
                }
                FieldKind::Exact | FieldKind::EnumSet => {}
            }
        }
        for sortable in &spec.sortable_fields {
            validate_identifier(sortable)?;
        }
        validate_identifier(&spec.default_sort.field)?;
        for column in [&spec.organization_column, &spec.department_column, &spec.owner_column, &spec.soft_delete_column]
            .into_iter()
            .flatten()
        {
            validate_identifier(column)?;
        }
        if spec.default_limit < 1 || spec.max_limit < spec.default_limit {
            return Err(QueryError::Configuration("default_limit must be >= 1 and <= max_limit".to_string()));
        }
        Ok(spec)
    }
}

/// Storage identifiers come only from registered specifications, but they are
/// still format-checked before ever reaching a rendered query.
pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(QueryError::Configuration(format!("Invalid identifier: {:?}", name)))
    }
}
