use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateRecordRequest, RecordIdQuery, RecordListQuery};
use super::services::{self, NewRecord};
use crate::{
    auth::AuthUser,
    db::{Record, RecordFilter},
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidQuery},
};

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/record",
            get(list_records)
                .post(create_record)
                .delete(delete_record_by_query),
        )
        .route("/record/:id", get(get_record).delete(delete_record))
}

/// GET /record?user_id=...&category_id=...
#[instrument(skip(state))]
pub async fn list_records(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<RecordListQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let filter = RecordFilter {
        user_id: q.user_id.filter(|v| !v.is_empty()),
        category_id: q.category_id.filter(|v| !v.is_empty()),
    };
    let records = services::list_records(state.repo.as_ref(), filter).await?;
    Ok(Json(records))
}

#[instrument(skip(state, payload))]
pub async fn create_record(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateRecordRequest>,
) -> Result<Json<Record>, ApiError> {
    let input = NewRecord {
        user_id: payload.user_id.unwrap_or_default(),
        category_id: payload.category_id.unwrap_or_default(),
        amount: payload.amount.unwrap_or_default(),
        currency_id: payload.currency_id,
    };
    let record = services::create_record(state.repo.as_ref(), &state.config.currency, input).await?;
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn get_record(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    state
        .repo
        .get_record(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("record", &id))
}

#[instrument(skip(state))]
pub async fn delete_record_by_query(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<RecordIdQuery>,
) -> Result<Json<Record>, ApiError> {
    let id = q
        .record_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::field("record_id", "Record id is required"))?;
    remove(&state, &id, &caller).await
}

#[instrument(skip(state))]
pub async fn delete_record(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    remove(&state, &id, &caller).await
}

async fn remove(state: &AppState, id: &str, caller: &str) -> Result<Json<Record>, ApiError> {
    let record = state
        .repo
        .delete_record(id)
        .await?
        .ok_or_else(|| ApiError::not_found("record", id))?;
    info!(record_id = %record.id, %caller, "record deleted");
    Ok(Json(record))
}
