use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::{ApiError, AuthError};

/// Extracts and validates the bearer JWT, yielding the caller's user ID.
/// Any handler taking this requires authentication.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Pulls the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;
    let value = header.to_str().map_err(|_| AuthError::Invalid)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(AuthError::Invalid)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Missing);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!(reason = %e, path = %parts.uri.path(), "rejected request without usable token");
            e
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.validate(token).map_err(|e| {
            warn!(reason = %e, path = %parts.uri.path(), "rejected token");
            e
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = value {
            h.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn no_header_is_missing() {
        assert_eq!(bearer_token(&headers(None)), Err(AuthError::Missing));
    }

    #[test]
    fn empty_bearer_is_missing() {
        assert_eq!(bearer_token(&headers(Some("Bearer "))), Err(AuthError::Missing));
    }

    #[test]
    fn other_scheme_is_invalid() {
        assert_eq!(bearer_token(&headers(Some("Basic Zm9vOmJhcg=="))), Err(AuthError::Invalid));
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def.ghi"))), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers(Some("bearer abc.def.ghi"))), Ok("abc.def.ghi"));
    }
}
