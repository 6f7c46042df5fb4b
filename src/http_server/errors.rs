//! # HTTP API Errors
//!
//! Maps storage failures and extractor rejections to status codes and the
//! failure envelope `{ "success": false, "error": ..., "code": ... }`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::storage::{ErrorKind, StoreError};

/// Seconds a client should wait before retrying a 503
const RETRY_AFTER_SECS: &str = "1";

/// Failure code for requests rejected before reaching the catalog
const INVALID_REQUEST: &str = "SHELF_INVALID_REQUEST";

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body is missing, not JSON, or the wrong shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Path parameter could not be parsed
    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Failure code recorded in logs
    pub fn failure_code(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) | ApiError::InvalidPath(_) => INVALID_REQUEST,
            ApiError::Store(err) => err.kind().code(),
        }
    }

    /// Message safe to show a client
    ///
    /// Driver text never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Store(err) => match err.kind() {
                ErrorKind::Transient => "storage temporarily unavailable, retry later".to_string(),
                ErrorKind::Internal => "internal server error".to_string(),
                _ => err.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Failure envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: u16,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            success: false,
            error: err.public_message(),
            code: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let failure = self.failure_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), failure, error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), failure, error = %self, "request rejected");
        }

        let mut response = (status, Json(ErrorResponse::from(&self))).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPath(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, FieldError};

    #[test]
    fn test_status_codes() {
        let cases = [
            (StoreError::not_found(EntityKind::Book, 1), StatusCode::NOT_FOUND),
            (StoreError::Validation(FieldError::Empty), StatusCode::BAD_REQUEST),
            (StoreError::conflict("taken"), StatusCode::CONFLICT),
            (StoreError::Transient("busy".into()), StatusCode::SERVICE_UNAVAILABLE),
            (StoreError::Internal("bad row".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(
            ApiError::InvalidBody("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(
            ApiError::InvalidBody("expected value".into()).failure_code(),
            "SHELF_INVALID_REQUEST"
        );
        assert_eq!(
            ApiError::InvalidPath("not a number".into()).failure_code(),
            "SHELF_INVALID_REQUEST"
        );
        assert_eq!(
            ApiError::from(StoreError::not_found(EntityKind::Book, 2)).failure_code(),
            "SHELF_NOT_FOUND"
        );
        assert_eq!(
            ApiError::from(StoreError::conflict("owned")).failure_code(),
            "SHELF_CONFLICT"
        );
    }

    #[test]
    fn test_rejection_response_is_bad_request() {
        let response = ApiError::InvalidPath("not a number".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_driver_text_is_hidden() {
        let err = ApiError::from(StoreError::Internal("no such column: secret".into()));
        assert!(!err.public_message().contains("secret"));

        let err = ApiError::from(StoreError::not_found(EntityKind::Author, 4));
        assert_eq!(err.public_message(), "author 4 does not exist");
    }

    #[test]
    fn test_unavailable_sets_retry_after() {
        let response = ApiError::from(StoreError::Transient("locked".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
