use crate::core::{StorageError, UnknownMetricKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors a handler can answer a request with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("metric not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<UnknownMetricKind> for ApiError {
    fn from(err: UnknownMetricKind) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::BadRequest(_) => "Bad request",
            ApiError::NotFound => "Not found",
            ApiError::MethodNotAllowed => "Method not allowed",
            ApiError::Storage(e) => {
                error!(error = %e, "Storage failure while handling request");
                "Internal server error"
            }
        };
        (self.status(), body).into_response()
    }
}
