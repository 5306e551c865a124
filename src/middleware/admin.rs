use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const MIGRATION_TOKEN_HEADER: &str = "x-migration-token";

/// Compare SHA-256 digests byte by byte without early exit, so timing
/// reveals neither content nor length of the secret
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// An empty configured secret never matches
pub fn token_matches(secret: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(token) if !secret.is_empty() => constant_time_compare(secret, token),
        _ => false,
    }
}

/// Gate for `/admin/*`: 403 unless `x-migration-token` equals
/// `MIGRATION_SECRET`. Runs before the body is looked at.
pub async fn require_migration_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = headers
        .get(MIGRATION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if !token_matches(&state.config.security.migration_secret, provided) {
        warn!(path = %request.uri().path(), "Rejected admin request with invalid migration token");
        return Err(ApiError::forbidden("Invalid or missing migration token"));
    }

    Ok(next.run(request).await)
}
