//! HTTP mapping of domain and infrastructure failures.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rb_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Internal(anyhow::Error),

    #[error("malformed form: {0}")]
    Multipart(#[from] MultipartError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Adapters report domain failures (e.g. an unreadable upload) inside
/// `anyhow::Error`; recover them so they keep their status code.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => ApiError::App(app),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::App(AppError::NotFound(..)) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::App(AppError::ValidationError(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Multipart(ref err) => (err.status(), self.to_string()),
            ApiError::App(AppError::Internal(_))
            | ApiError::Internal(_)
            | ApiError::Template(_) => {
                tracing::error!(err = ?self, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal server error, see logs for details"),
                )
            }
        };

        if status.is_client_error() {
            tracing::info!(%status, "returning error to client: {message}");
        }
        (status, message).into_response()
    }
}
