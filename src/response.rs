//! Success envelope shared by the resource endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Wrapper for API responses that adds the success envelope.
///
/// ```json
/// { "status": "success", "data": { ... }, "message": "Page created successfully" }
/// ```
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: StatusCode,
    pub data: Option<T>,
    pub message: &'static str,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    message: &'static str,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with data.
    pub fn ok(data: T, message: &'static str) -> Self {
        Self {
            status_code: StatusCode::OK,
            data: Some(data),
            message,
        }
    }

    /// 201 Created with data.
    pub fn created(data: T, message: &'static str) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            data: Some(data),
            message,
        }
    }
}

impl ApiResponse<()> {
    /// 200 OK carrying only a message (used by deletes).
    pub fn message(message: &'static str) -> Self {
        Self {
            status_code: StatusCode::OK,
            data: None,
            message,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: "success",
            data: self.data.as_ref(),
            message: self.message,
        };

        (self.status_code, Json(envelope)).into_response()
    }
}
