use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("Please save an API key first.")]
    MissingCredential,

    #[error("Another action is still running for this session")]
    ActionInProgress,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Error generating cover letter: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, shared by the HTTP envelope and the session view state.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MissingInput(_) => "MISSING_INPUT",
            AppError::MissingCredential => "MISSING_CREDENTIAL",
            AppError::ActionInProgress => "ACTION_IN_PROGRESS",
            AppError::Extraction(e) => e.code(),
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text shown to the user. Wrapped messages are passed through without the
    /// `Display` prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::MissingInput(_) | AppError::MissingCredential => {
                StatusCode::BAD_REQUEST
            }
            AppError::ActionInProgress => StatusCode::CONFLICT,
            AppError::Extraction(e) => match e {
                ExtractionError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                ExtractionError::HttpStatus(_) | ExtractionError::Network(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ExtractionError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ExtractionError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ExtractionError::TooShort { .. } | ExtractionError::Parse(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Generation(msg) => tracing::warn!("Generation error: {msg}"),
            AppError::Extraction(e) => tracing::info!("Extraction failed ({}): {e}", e.code()),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }
        let message = self.user_message();

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_errors_keep_their_own_code() {
        let err = AppError::from(ExtractionError::Timeout);
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_too_short_is_unprocessable() {
        let err = AppError::from(ExtractionError::TooShort {
            chars: 10,
            min: 100,
            message: "too short".to_string(),
        });
        assert_eq!(err.code(), "TOO_SHORT");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_in_progress_is_conflict() {
        assert_eq!(AppError::ActionInProgress.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_wrapped_messages_have_no_prefix() {
        let err = AppError::Validation("Please enter an API key".to_string());
        assert_eq!(err.user_message(), "Please enter an API key");
        let err = AppError::NotFound("Session abc not found".to_string());
        assert_eq!(err.user_message(), "Session abc not found");
        assert_eq!(
            AppError::Generation("quota".to_string()).user_message(),
            "Error generating cover letter: quota"
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
