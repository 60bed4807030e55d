use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldErrors};

pub const MISSING_FIELD: &str = "Missing data for required field.";

/// Input payloads check their own shape after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Collects field errors for a payload.
#[derive(Default)]
pub struct Checker {
    errors: FieldErrors,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Required, non-blank string of at most `max` chars.
    pub fn name(&mut self, field: &str, value: Option<&str>, max: usize) {
        match value {
            None => self.add(field, MISSING_FIELD),
            Some(v) if v.trim().is_empty() => self.add(field, "Field may not be blank."),
            Some(v) if v.chars().count() > max => {
                self.add(field, format!("Longer than maximum length {max}."))
            }
            Some(_) => {}
        }
    }

    pub fn require<T>(&mut self, field: &str, value: Option<&T>) {
        if value.is_none() {
            self.add(field, MISSING_FIELD);
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// JSON body extractor that maps parse failures and failed checks to a 400.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rej| ApiError::field("_schema", rej.body_text()))?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidJson(value))
    }
}

/// Query-string extractor whose parse failures become a structured 400.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rej| ApiError::field("_query", rej.body_text()))?;
        Ok(ValidQuery(value))
    }
}
