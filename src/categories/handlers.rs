use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CategoryIdQuery, CreateCategoryRequest};
use crate::{
    auth::AuthUser,
    db::{new_id, Category},
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidQuery},
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/category",
            get(list_categories)
                .post(create_category)
                .delete(delete_category_by_query),
        )
        .route("/category/:id", get(get_category).delete(delete_category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories().await?))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let category = Category {
        id: new_id(),
        name: payload.name.unwrap_or_default().trim().to_string(),
    };
    state
        .repo
        .insert_category(&category)
        .await
        .map_err(|e| ApiError::from_repo("category", e))?;
    info!(category_id = %category.id, name = %category.name, %caller, "category created");
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn get_category(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    state
        .repo
        .get_category(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("category", &id))
}

/// DELETE /category?category_id=...
#[instrument(skip(state))]
pub async fn delete_category_by_query(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<CategoryIdQuery>,
) -> Result<Json<Category>, ApiError> {
    let id = q
        .category_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::field("category_id", "Category id is required"))?;
    remove(&state, &id, &caller).await
}

#[instrument(skip(state))]
pub async fn delete_category(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    remove(&state, &id, &caller).await
}

async fn remove(state: &AppState, id: &str, caller: &str) -> Result<Json<Category>, ApiError> {
    let category = state
        .repo
        .delete_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("category", id))?;
    info!(category_id = %category.id, %caller, "category deleted");
    Ok(Json(category))
}
