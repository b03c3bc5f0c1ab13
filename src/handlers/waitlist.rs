use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::query::{PagedResult, RawRequest};

use super::{principal_of, AppState};

/// GET /api/waitlist - scoped waitlist search
pub async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<PagedResult<Value>>, ApiError> {
    let raw = RawRequest::new(params);
    let result = state.search.search("waitlist_entries", &raw, principal_of(&auth)).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
}

/// POST /api/waitlist - join a waitlist; duplicate pair yields 409
pub async fn join(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<JoinRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let entry = state
        .waitlist
        .join(body.appointment_id, body.patient_id, principal_of(&auth))
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
