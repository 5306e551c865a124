use thiserror::Error;

use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("base URL cannot carry path segments: {0}")]
    InvalidBaseUrl(String),

    /// Non-2xx answer, decoded from the `{error, message, code}` body
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        errors: Vec<FieldError>,
    },

    /// Rejected locally; nothing was sent
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing {0}")]
    MissingCredential(&'static str),
}

impl ClientError {
    /// Field errors from either a local or a server-side validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Api { errors, .. } | ClientError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
