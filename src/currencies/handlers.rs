use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateCurrencyRequest, CurrencyIdQuery};
use crate::{
    auth::AuthUser,
    db::{new_id, Currency},
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidQuery},
};

pub fn currency_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/currency",
            get(list_currencies)
                .post(create_currency)
                .delete(delete_currency_by_query),
        )
        .route("/currency/:id", get(get_currency).delete(delete_currency))
}

#[instrument(skip(state))]
pub async fn list_currencies(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Currency>>, ApiError> {
    Ok(Json(state.repo.list_currencies().await?))
}

#[instrument(skip(state, payload))]
pub async fn create_currency(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateCurrencyRequest>,
) -> Result<Json<Currency>, ApiError> {
    let currency = Currency {
        id: new_id(),
        name: payload.name.unwrap_or_default().trim().to_string(),
    };
    state
        .repo
        .insert_currency(&currency)
        .await
        .map_err(|e| ApiError::from_repo("currency", e))?;
    info!(currency_id = %currency.id, name = %currency.name, %caller, "currency created");
    Ok(Json(currency))
}

#[instrument(skip(state))]
pub async fn get_currency(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Currency>, ApiError> {
    state
        .repo
        .get_currency(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("currency", &id))
}

#[instrument(skip(state))]
pub async fn delete_currency_by_query(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<CurrencyIdQuery>,
) -> Result<Json<Currency>, ApiError> {
    let id = q
        .currency_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::field("currency_id", "Currency id is required"))?;
    remove(&state, &id, &caller).await
}

#[instrument(skip(state))]
pub async fn delete_currency(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Currency>, ApiError> {
    remove(&state, &id, &caller).await
}

// users and records pointing at it fall back to no currency
async fn remove(state: &AppState, id: &str, caller: &str) -> Result<Json<Currency>, ApiError> {
    let currency = state
        .repo
        .delete_currency(id)
        .await?
        .ok_or_else(|| ApiError::not_found("currency", id))?;
    info!(currency_id = %currency.id, %caller, "currency deleted");
    Ok(Json(currency))
}
