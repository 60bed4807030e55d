use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::db::RepoError;

/// Field name -> list of problems with that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Why an authenticated request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("missing token")]
    Missing,
    #[error("invalid credentials")]
    BadCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("No {entity} found with id {id}"))
    }

    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Maps a repository failure, turning a uniqueness violation into a
    /// client-facing "already exists" conflict for `entity`.
    pub fn from_repo(entity: &str, err: RepoError) -> Self {
        match err {
            RepoError::Conflict(_) => Self::Conflict(format!("This {entity} already exists")),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "errors": errors }),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidReference(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid data", "details": details }),
            ),
            ApiError::Auth(AuthError::Expired) => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "The token has expired.", "error": "token_expired" }),
            ),
            ApiError::Auth(AuthError::Invalid) => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Signature verification failed.", "error": "invalid_token" }),
            ),
            ApiError::Auth(AuthError::Missing) => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "description": "Request does not contain an access token.",
                    "error": "authorization_required",
                }),
            ),
            ApiError::Auth(AuthError::BadCredentials) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid credentials" }),
            ),
            ApiError::Internal(e) => {
                error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
