use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::pages;

/// Failures a handler cannot answer with a re-rendered form.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for WebError {
    fn from(e: tokio::task::JoinError) -> Self {
        WebError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            WebError::NotFound => (StatusCode::NOT_FOUND, "The page you asked for does not exist."),
            WebError::BadRequest(reason) => (StatusCode::BAD_REQUEST, *reason),
            WebError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side.")
            }
        };

        (status, Html(pages::error_page(status, detail))).into_response()
    }
}
