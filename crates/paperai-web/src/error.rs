use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures of the front end itself. Backend failures and unreadable
/// uploads never end up here: views turn them into notices or fallback
/// chat turns.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        tracing::error!("{}", self);
        (status, status.canonical_reason().unwrap_or("Error").to_string()).into_response()
    }
}
