//! Worker server error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use scenecast_media::MediaError;

pub type WorkerServerResult<T> = Result<T, WorkerServerError>;

#[derive(Debug, Error)]
pub enum WorkerServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rendering failed: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerServerError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkerServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WorkerServerError::Media(_) | WorkerServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for WorkerServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
