use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::MessageResponse;

/// Result alias used by every operation that can reach a client.
pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// The error taxonomy surfaced to HTTP clients. Every variant renders as a
/// `{"message": "..."}` body with the matching status code.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// Malformed or duplicate input on create/update.
    #[error("{0}")]
    Validation(String),

    /// An id or reference that does not resolve.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Store unavailable or any other unexpected failure. The detail is logged, not returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

// Missing fields, wrong types, a non-JSON content type: all bad input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "json body rejected");
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// RepoError
///
/// Failures raised by a document store adapter.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique index rejected the write (username or email already taken).
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Logs the store failure and converts it into the client-facing error, using
    /// `context` as the short message for infrastructure failures.
    pub fn into_api(self, context: &'static str) -> ApiError {
        match self {
            Self::Duplicate(field) => ApiError::validation(format!("{field} already exists")),
            Self::Database(e) => {
                tracing::error!("{context}: {:?}", e);
                ApiError::internal(context)
            }
        }
    }
}
