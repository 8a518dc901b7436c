//! API Error Types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reading_validator::ValidationError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload failed field validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body could not be read as the expected JSON
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    /// Body sent without a JSON content type
    #[error("Expected request with `Content-Type: application/json`")]
    UnsupportedMediaType,

    /// Storage failed; details stay in the logs
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType,
            other => ApiError::MalformedBody(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Storage(e) => {
                error!("Storage failure: {}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ValidationError::MissingField("location")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::UnsupportedMediaType.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            ApiError::from(StorageError::DatabaseError("connection refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_is_descriptive() {
        let err = ApiError::from(ValidationError::MissingField("humidity_value"));
        assert_eq!(err.to_string(), "Missing required field: humidity_value");
    }
}
