use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use super::dto::{AuthResponse, LoginRequest, RegisterRequest};
use super::services::{authenticate, register_user, NewUser};
use crate::{db::User, error::ApiError, state::AppState, validation::ValidJson};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    let username = payload.username.as_deref().unwrap_or_default().trim();
    let user = register_user(
        state.repo.as_ref(),
        &state.config.currency,
        NewUser {
            username,
            password: payload.password.as_deref().unwrap_or_default(),
            default_currency_id: payload.default_currency_id.as_deref(),
        },
    )
    .await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = payload.username.as_deref().unwrap_or_default().trim();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = authenticate(state.repo.as_ref(), username, password).await?;
    let access_token = state.keys.issue(&user.id)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse { access_token, user }))
}
