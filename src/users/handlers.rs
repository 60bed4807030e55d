use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{auth::AuthUser, db::User, error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:id", get(get_user).delete(delete_user))
        .route("/users", get(list_users))
}

#[instrument(skip(state))]
pub async fn get_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .repo
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user", &id))
}

/// Removes the user together with all of their records.
#[instrument(skip(state))]
pub async fn delete_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .repo
        .delete_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", &id))?;
    info!(user_id = %user.id, %caller, "user deleted");
    Ok(Json(json!({
        "message": format!("User with id {} successfully deleted", user.id)
    })))
}

#[instrument(skip(state))]
pub async fn list_users(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.repo.list_users().await?))
}
