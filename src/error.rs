// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::query::QueryError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (storage dependency failure)
    BadGateway(String),

    // 504 Gateway Timeout (storage dependency timeout)
    GatewayTimeout(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::GatewayTimeout(_) => 504,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::GatewayTimeout(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(msg) => ApiError::ValidationError(msg),
            QueryError::Authentication(msg) => ApiError::Unauthorized(msg),
            QueryError::Authorization(msg) => ApiError::Forbidden(msg),
            QueryError::NotFound(msg) => ApiError::NotFound(msg),
            QueryError::Conflict(msg) => ApiError::Conflict(msg),
            QueryError::Configuration(msg) => {
                tracing::error!("configuration error: {}", msg);
                ApiError::InternalServerError("An error occurred while processing your request".to_string())
            }
            QueryError::Mapping(msg) => {
                tracing::error!("row mapping error: {}", msg);
                ApiError::InternalServerError("An error occurred while processing your request".to_string())
            }
            QueryError::Dependency { message, timeout } => {
                tracing::error!(timeout, "storage dependency error: {}", message);
                if timeout {
                    ApiError::GatewayTimeout("Storage timed out".to_string())
                } else {
                    ApiError::BadGateway("Storage temporarily unavailable".to_string())
                }
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[test]
    fn query_errors_map_to_documented_status_codes() {
        let cases = [
            (QueryError::validation("bad page"), 400),
            (QueryError::Authentication("no token".into()), 401),
            (QueryError::Authorization("bad role".into()), 403),
            (QueryError::NotFound("gone".into()), 404),
            (QueryError::Conflict("dup".into()), 409),
            (QueryError::Configuration("unregistered".into()), 500),
            (QueryError::Mapping("drift".into()), 500),
            (QueryError::dependency("down", false), 502),
            (QueryError::dependency("slow", true), 504),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked_to_clients() {
        let api = ApiError::from(QueryError::Configuration("resource 'secret_table' is not registered".into()));
        assert!(!api.message().contains("secret_table"));
    }
}
