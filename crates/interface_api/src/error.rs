//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use domain_order::{ErrorCode, OrderError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_argument",
            ApiError::Validation(_) => "validation_error",
            ApiError::PreconditionFailed(_) => "failed_precondition",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "aborted",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err.code() {
            ErrorCode::InvalidArgument => ApiError::BadRequest(message),
            ErrorCode::FailedPrecondition => ApiError::PreconditionFailed(message),
            ErrorCode::NotFound => ApiError::NotFound(message),
            ErrorCode::Aborted => ApiError::Conflict(message),
            ErrorCode::Internal => {
                error!(error = %message, "Order storage failure");
                ApiError::Internal(message)
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CourseId, StudentProductId};

    #[test]
    fn test_order_error_status_mapping() {
        let course_id = CourseId::new();
        let bad = ApiError::from(OrderError::CourseMismatch { course_id });
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert!(bad.to_string().contains(&course_id.to_string()));

        let id = StudentProductId::new();
        assert_eq!(
            ApiError::from(OrderError::StudentProductNotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrderError::StaleVersion {
                student_product_id: id,
                expected: 1,
                actual: 2
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(OrderError::PendingOrderExists { student_product_id: id }).status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiError::from(OrderError::storage("connection reset")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
