use axum::{routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/healthcheck", get(healthcheck))
}

/// Liveness only; does not touch the database.
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: OffsetDateTime::now_utc(),
    })
}
