use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::errors::CertforgeError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(ErrorBody { success: false, error: message })).into_response()
    }
}

impl From<CertforgeError> for ApiError {
    fn from(err: CertforgeError) -> Self {
        match err {
            CertforgeError::Validation { message, .. } => ApiError::BadRequest(message),
            CertforgeError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("No {} found for '{}'", resource_type, id))
            }
            CertforgeError::Conflict { message, .. } => ApiError::Conflict(message),
            // Everything else is an operator concern; the caller gets a
            // generic message and the detail stays in the logs.
            other => {
                tracing::error!(error = %other, "Request failed with internal error");
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}
