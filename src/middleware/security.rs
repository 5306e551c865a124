use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{self, HeaderName, HeaderValue},
        uri::PathAndQuery,
        Uri,
    },
    middleware::Next,
    response::Response,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::sanitize::{sanitize_query_pairs, sanitize_value};
use crate::state::AppState;

/// Fixed headers set on every response
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("x-xss-protection", "0"),
];

pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SECURITY_HEADERS.iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}

/// Reject bodies whose declared length exceeds the cap before reading them
pub async fn limit_body_size(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.config.api.max_request_size_bytes;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > limit {
            return Err(too_large(limit));
        }
    }

    Ok(next.run(request).await)
}

fn too_large(limit: usize) -> ApiError {
    ApiError::payload_too_large(format!("Request body exceeds the {} byte limit", limit))
}

/// Sanitize the query string and any JSON body before routing.
///
/// Query pairs go through key stripping, escaping, trimming and parameter
/// pollution rules. JSON bodies lose `$`-prefixed and dotted keys and have
/// every string leaf escaped and trimmed. Bodies that are not JSON pass
/// through untouched and are rejected later by the extractors.
pub async fn sanitize_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(query) = request.uri().query() {
        let cleaned = clean_query(query, &state.config.security.hpp_whitelist);
        *request.uri_mut() = replace_query(request.uri(), &cleaned)?;
    }

    let limit = state.config.api.max_request_size_bytes;
    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| too_large(limit))?;

    if bytes.is_empty() {
        return Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await);
    }

    let body = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(mut value) => {
            sanitize_value(&mut value);
            let cleaned = serde_json::to_vec(&value)
                .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
            parts.headers.remove(header::CONTENT_LENGTH);
            Body::from(cleaned)
        }
        Err(_) => Body::from(bytes),
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub fn clean_query(query: &str, whitelist: &[String]) -> String {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
    let cleaned = sanitize_query_pairs(pairs, whitelist);
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(cleaned)
        .finish()
}

fn replace_query(uri: &Uri, query: &str) -> Result<Uri, ApiError> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };
    debug!(query = %query, "Sanitized query string");

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::from_str(&path_and_query).map_err(|e| ApiError::bad_request(e.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|e| ApiError::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn whitelist() -> Vec<String> {
        AppConfig::development().security.hpp_whitelist
    }

    #[test]
    fn duplicate_query_keys_collapse_unless_whitelisted() {
        let cleaned = clean_query("q=pan&q=leche&estado=PENDIENTE&estado=ENVIADO", &whitelist());
        assert_eq!(cleaned, "q=leche&estado=PENDIENTE&estado=ENVIADO");
    }

    #[test]
    fn query_values_are_escaped_and_trimmed() {
        let cleaned = clean_query("q=%20%3Cb%3Epan%3C%2Fb%3E%20&%24where=1", &whitelist());
        assert_eq!(cleaned, "q=%26lt%3Bb%26gt%3Bpan%26lt%3B%2Fb%26gt%3B");
    }

    #[test]
    fn query_is_replaced_in_uri() {
        let uri: Uri = "/api/productos?q=a&q=b".parse().unwrap();
        let replaced = replace_query(&uri, "q=b").unwrap();
        assert_eq!(replaced.to_string(), "/api/productos?q=b");
        assert_eq!(replace_query(&uri, "").unwrap().to_string(), "/api/productos");
    }

    #[test]
    fn header_names_are_valid() {
        for (name, value) in SECURITY_HEADERS {
            assert!(HeaderName::from_str(name).is_ok());
            assert!(HeaderValue::from_str(value).is_ok());
        }
    }
}
