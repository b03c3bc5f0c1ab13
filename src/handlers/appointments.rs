use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::query::{PagedResult, RawRequest};

use super::{principal_of, AppState};

/// GET /api/appointments - scoped search with filters and pagination
pub async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<PagedResult<Value>>, ApiError> {
    let raw = RawRequest::new(params);
    let result = state.search.search("appointments", &raw, principal_of(&auth)).await?;
    Ok(Json(result))
}

/// GET /api/appointments/:id - single record; out-of-scope reads as 404
pub async fn get(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let record = state.search.get_by_id("appointments", id, principal_of(&auth)).await?;
    Ok(Json(record))
}
