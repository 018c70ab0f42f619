//! Client-facing error taxonomy.
//!
//! Every failure a route can produce is an [`ApiError`]; each variant maps to
//! exactly one status code and one message. Internal details stay in the
//! `source` chain for logging and never reach the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::models::ErrorResponse;
use crate::inference::InferenceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing '{0}' field in request body")]
    MissingField(&'static str),

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("{0}")]
    WrongType(&'static str),

    #[error("Maximum {max} texts per batch")]
    BatchTooLarge { max: usize, actual: usize },

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Internal server error")]
    Internal(#[from] InferenceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::EmptyText
            | ApiError::WrongType(_)
            | ApiError::BatchTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
