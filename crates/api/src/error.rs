//! Error responses for API handlers.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inkpress_shared::AppError;
use inkpress_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Application error with its own status code.
    #[error(transparent)]
    App(#[from] AppError),

    /// Malformed or oversized multipart body.
    #[error("Invalid multipart body: {}", .0.body_text())]
    Multipart(#[from] MultipartError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::App(err.into())
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::App(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Multipart(e) => e.status(),
        }
    }

    /// Error code for the response body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::App(e) => e.error_code(),
            Self::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "PAYLOAD_TOO_LARGE"
            }
            Self::Multipart(_) => "INVALID_MULTIPART",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case(AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(
        AppError::ExternalService("x".into()),
        StatusCode::BAD_GATEWAY,
        "EXTERNAL_SERVICE_ERROR"
    )]
    #[case(AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    fn test_app_error_mapping(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let err = ApiError::from(err);
        assert_eq!(err.status_code(), status);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_storage_validation_is_bad_request() {
        let err = ApiError::from(StorageError::file_too_large(11, 10));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(StorageError::Upstream {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        use http_body_util::BodyExt;

        let response = ApiError::from(AppError::NotFound("no file".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"], "NOT_FOUND");
        assert_eq!(json["message"], "Not found: no file");
    }
}
