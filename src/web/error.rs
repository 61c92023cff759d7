// Error types for the API server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::models::ErrorResponse;
use crate::remover::RemovalError;

/// API server error types
#[derive(Debug)]
pub enum ApiError {
    BadUpload(String),
    UndecodableImage(String),
    Inference(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    // Every failure is reported as HTTP 200 with a JSON body. Existing
    // clients distinguish success from failure by the Content-Type of the
    // response, not the status code, so the mapping must stay 200 for all
    // variants.
    fn into_response(self) -> Response {
        let error = match self {
            Self::BadUpload(msg)
            | Self::UndecodableImage(msg)
            | Self::Inference(msg)
            | Self::Internal(msg) => msg,
        };

        (StatusCode::OK, Json(ErrorResponse { error })).into_response()
    }
}

impl From<RemovalError> for ApiError {
    fn from(error: RemovalError) -> Self {
        Self::Inference(error.to_string())
    }
}
