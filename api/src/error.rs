use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grants::GrantError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// API error types. Denials are normal results, not exceptions: the
/// unauthenticated / forbidden split is load-bearing for every guarded
/// endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Grant store failure. The body stays generic; the storage
    /// detail goes to the operator log only.
    #[error("Grant store unavailable")]
    Database,

    /// Signage server failure, same generic-body treatment.
    #[error("Signage server unavailable")]
    Upstream,

    #[error("Internal server error")]
    InternalError,
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream => StatusCode::BAD_GATEWAY,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Database => "DATABASE_ERROR",
            ApiError::Upstream => "UPSTREAM_ERROR",
            ApiError::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Grant-layer errors cross the HTTP boundary here. Validation detail
/// is safe to surface; storage failures are logged and squashed to a
/// generic body, and the request fails closed.
impl From<GrantError> for ApiError {
    fn from(err: GrantError) -> Self {
        match err {
            GrantError::Validation(msg) => ApiError::Validation(msg),
            other => {
                error!("Grant store failure: {}", other);
                ApiError::Database
            }
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
