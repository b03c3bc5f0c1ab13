use thiserror::Error;

/// Engine error taxonomy. Everything the pipeline can fail with maps onto
/// exactly one variant; the HTTP layer owns the status-code mapping.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage dependency failed: {message}")]
    Dependency { message: String, timeout: bool },

    #[error("Row mapping failed: {0}")]
    Mapping(String),
}

impl QueryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        QueryError::Validation(msg.into())
    }

    pub fn dependency(msg: impl Into<String>, timeout: bool) -> Self {
        QueryError::Dependency { message: msg.into(), timeout }
    }
}
