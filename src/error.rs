//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::storage::StorageError;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Bearer token is missing, malformed, or unknown.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthenticated. Please provide a valid token.")]
    Unauthenticated,

    /// Login attempt with an unknown e-mail or a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The authenticated user may not perform this action.
    ///
    /// Returns HTTP 403 Forbidden. The String is the policy's denial message.
    #[error("{0}")]
    Forbidden(String),

    /// Requested resource does not exist (or is soft-deleted / unpublished).
    #[error("{0}")]
    NotFound(String),

    /// One or more request fields failed validation.
    ///
    /// Returns HTTP 422 with the per-field messages.
    #[error("Invalid input data")]
    Validation(ValidationErrors),

    /// The request is well-formed but cannot be processed as a whole.
    #[error("{0}")]
    Unprocessable(String),

    /// Unexpected failure outside the database and storage layers.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        AppError::Unprocessable(message.into())
    }

    /// A validation failure on a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    /// A unique-index violation becomes `field`'s validation error; any other
    /// database error passes through.
    pub fn unique_violation(error: sqlx::Error, field: &str, message: &str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::invalid_field(field, message)
            }
            _ => AppError::Database(error),
        }
    }
}

/// Per-field validation messages, serialized as `{ "field": ["msg", ...] }`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise the accumulated failure.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "status": "error",
///   "message": "Invalid input data",
///   "errors": { "title": ["The title field is required."] }
/// }
/// ```
///
/// `errors` is only present for validation failures. Database, storage and
/// internal errors are logged and reported with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string(), None)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Validation(ref errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.to_string(),
                Some(errors.clone()),
            ),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = match errors {
            Some(errors) => json!({
                "status": "error",
                "message": message,
                "errors": errors,
            }),
            None => json!({
                "status": "error",
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("banner", "third");

        assert_eq!(errors.get("title").unwrap(), ["first", "second"]);
        assert!(errors.has("banner"));
        assert!(!errors.has("content"));

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["title"][1], "second");
    }

    #[test]
    fn empty_validation_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn status_codes_follow_variants() {
        let cases = [
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (AppError::not_found("Page not found"), StatusCode::NOT_FOUND),
            (
                AppError::invalid_field("slug", "Invalid slug format"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::unprocessable("No data provided for update"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
