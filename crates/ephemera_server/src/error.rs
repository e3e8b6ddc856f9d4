//! HTTP error mapping for API handlers.

use crate::AppError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ephemera_core::ErrorKind;
use serde_json::json;

/// Error returned by handlers; renders as `{"error": "..."}` JSON.
#[derive(Debug)]
pub enum HttpError {
    /// Domain error from the lifecycle managers.
    App(AppError),
    /// Transport-level failure with an explicit status (malformed multipart,
    /// body over the size limit).
    Status(StatusCode, String),
}

impl HttpError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::App(AppError::InvalidInput(message.into()))
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::Status(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("file exceeds {} bytes", limit),
        )
    }
}

/// Status code for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Expired => StatusCode::GONE,
        ErrorKind::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<MultipartError> for HttpError {
    fn from(value: MultipartError) -> Self {
        Self::Status(value.status(), value.body_text())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            HttpError::Status(status, message) => (status, message),
            HttpError::App(err) => {
                let status = status_for(err.kind());
                let message = match err {
                    AppError::InvalidInput(message) => message,
                    AppError::Storage { .. } | AppError::RollbackFailed { .. } => {
                        tracing::error!(error = %err, "Storage failure");
                        "Internal server error".to_string()
                    }
                    other => other.to_string(),
                };
                (status, message)
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{status_for, HttpError};
    use crate::AppError;
    use axum::{http::StatusCode, response::IntoResponse};
    use ephemera_core::{ErrorKind, StorageError};

    #[test]
    fn kinds_map_to_distinct_statuses() {
        let cases = [
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Expired, StatusCode::GONE),
            (ErrorKind::LimitExceeded, StatusCode::TOO_MANY_REQUESTS),
            (ErrorKind::InvalidInput, StatusCode::BAD_REQUEST),
            (ErrorKind::StorageFailure, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(status_for(kind), status, "kind: {:?}", kind);
        }
    }

    #[test]
    fn storage_failures_render_as_internal_errors() {
        let err = AppError::storage("find paste", "abc", StorageError::Cancelled);
        let response = HttpError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn explicit_status_is_preserved() {
        let response =
            HttpError::Status(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
