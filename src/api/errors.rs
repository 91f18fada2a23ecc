use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::errors::Error;

/// Failures a handler can answer with. Storage details never reach the client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Path id is not a positive integer
    #[error("Invalid artist ID")]
    InvalidArtistId,

    /// Body is not a valid artist draft
    #[error("Invalid request")]
    InvalidRequest,

    /// No artist has the requested id
    #[error("Artist not found")]
    ArtistNotFound,

    /// The request outlived the server's request timeout
    #[error("Request timed out")]
    RequestTimeout,

    /// Anything else; the source is logged, never returned
    #[error("Internal server error")]
    Internal(#[source] Error),
}

impl ApiError {
    /// HTTP status this error is answered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArtistId | ApiError::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiError::ArtistNotFound => StatusCode::NOT_FOUND,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => ApiError::ArtistNotFound,
            other => ApiError::Internal(other),
        }
    }
}

/// Error envelope: `{"error": "<message>"}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Client-facing message
    pub error: String,
}

/// Gives bodiless 408 responses from the timeout layer the JSON error envelope.
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::RequestTimeout.into_response();
    }
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            error!("Request failed: {source}");
        }
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
