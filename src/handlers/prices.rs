use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::query::{PagedResult, RawRequest};

use super::{principal_of, AppState};

/// GET /api/ingredient-prices - scoped price search
pub async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<PagedResult<Value>>, ApiError> {
    let raw = RawRequest::new(params);
    let result = state.search.search("ingredient_prices", &raw, principal_of(&auth)).await?;
    Ok(Json(result))
}
