//! Object download for disks the app serves itself.
//!
//! - GET /storage/{*key} - Raw object bytes with their stored content type

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, storage::SharedStorage};

pub async fn serve_object(
    State(storage): State<SharedStorage>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let (bytes, content_type) = storage
        .read(&key)
        .await?
        .ok_or_else(|| AppError::not_found("Resource not found"))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
