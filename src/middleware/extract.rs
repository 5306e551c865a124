use std::str::FromStr;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::sanitize::{clean_text, query_to_value};
use crate::validation::{ensure_valid, RequestRules};

/// JSON body that passed its validation chains.
///
/// The raw JSON is checked first so every field error is reported at once;
/// only then is it deserialized into `T`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + RequestRules,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(body_rejection)?;
        if bytes.is_empty() {
            return Err(ApiError::invalid_json("Request body is empty"));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?;
        ensure_valid(T::check(&value))?;

        serde_json::from_value(value)
            .map(ValidatedJson)
            .map_err(|e| ApiError::invalid_json(format!("Invalid request body: {}", e)))
    }
}

fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(rejection.body_text())
    } else {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Query string that passed its validation chains. Repeated keys arrive as
/// arrays.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + RequestRules,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs: Vec<(String, String)> = parts
            .uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let value = query_to_value(&pairs);
        ensure_valid(T::check(&value))?;

        serde_json::from_value(value)
            .map(ValidatedQuery)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))
    }
}

/// Single path parameter, escaped and trimmed like every other input, then
/// parsed into `T`
#[derive(Debug)]
pub struct CleanPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for CleanPath<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let cleaned = clean_text(&raw);
        cleaned
            .parse::<T>()
            .map(CleanPath)
            .map_err(|e| ApiError::bad_request(format!("Invalid path parameter '{}': {}", cleaned, e)))
    }
}
