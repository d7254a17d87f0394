//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON or multipart body, URL params, caller)
//! 2. Resolves the target, authorizes, then validates the input
//! 3. Calls the service layer and wraps the result in the success envelope

use axum::{
    Json,
    extract::{
        Multipart,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
};

use crate::{error::AppError, upload::MultipartForm};

/// Register, login, logout and the current user
pub mod auth;
/// Service monitoring
pub mod health;
/// Media library endpoints
pub mod media;
/// Page endpoints
pub mod pages;
/// Role endpoints
pub mod roles;
/// Stored files for the in-memory disk
pub mod storage;
/// Team member endpoints
pub mod teams;

/// Unwrap a JSON body, reporting a malformed one as 422.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejecting JSON body: {}", rejection.body_text());
            Err(AppError::unprocessable("Invalid JSON body"))
        }
    }
}

/// Drain a multipart body. A missing or non-multipart body is reported as 422.
pub(crate) async fn form_body(
    body: Result<Multipart, MultipartRejection>,
) -> Result<MultipartForm, AppError> {
    let multipart = body.map_err(|rejection| {
        tracing::debug!("Rejecting form body: {}", rejection.body_text());
        AppError::unprocessable("Invalid form data")
    })?;
    MultipartForm::collect(multipart).await
}

/// Parse a numeric `{id}` path segment. Anything else is an unknown resource.
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found(not_found))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::not_found("Resource not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42", "Page not found").unwrap(), 42);
        assert!(matches!(parse_id("abc", "Page not found"), Err(AppError::NotFound(m)) if m == "Page not found"));
        assert!(parse_id("0", "Role not found").is_err());
        assert!(parse_id("-3", "Role not found").is_err());
    }
}
