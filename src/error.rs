//! Error types for the library API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(messages) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: messages })).into_response()
            }
            AppError::BusinessRule(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::single(message))).into_response()
            }
            AppError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                StatusCode::NOT_FOUND.into_response()
            }
            AppError::InvalidArgument(msg) => {
                tracing::error!("Invalid argument: {}", msg);
                internal_error_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                internal_error_response()
            }
            AppError::Email(msg) => {
                tracing::error!("Email error: {}", msg);
                internal_error_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_error_response()
            }
        }
    }
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::single("Internal server error")),
    )
        .into_response()
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_validation_messages_are_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("title", ValidationError::new("length").with_message("Title is required".into()));
        errors.add("author", ValidationError::new("length").with_message("Author is required".into()));

        match AppError::from(errors) {
            AppError::Validation(messages) => {
                assert_eq!(messages, vec!["Author is required", "Title is required"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BusinessRule("Book already loaned.".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("loan 1".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidArgument("book id cant be null.".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
