//! Media library HTTP handlers.
//!
//! - GET /api/media - List media items
//! - GET /api/media/{id} - Get a media item
//! - POST /api/media - Upload a file (admin, multipart)
//! - PUT /api/media/{id} - Rename and/or replace the file (admin, multipart)
//! - DELETE /api/media/{id} - Delete the file and soft-delete the item (admin)

use axum::{
    Extension,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};

use crate::{
    db::DbPool,
    error::{AppError, ValidationErrors},
    handlers::{form_body, parse_id},
    middleware::auth::AuthContext,
    models::media::MediaResponse,
    policy::{self, Action, Resource},
    response::ApiResponse,
    services::media_service,
    storage::SharedStorage,
    upload::MEDIA_FILE,
    validation::{check_display_name, check_updated_name},
};

const MEDIA_NOT_FOUND: &str = "Media not found";

/// List media, newest first.
///
/// `file_path` is `null` for items whose object is missing from storage.
pub async fn list_media(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
) -> Result<ApiResponse<Vec<MediaResponse>>, AppError> {
    let items = media_service::list(&pool, &storage).await?;

    Ok(ApiResponse::ok(items, "Media list retrieved successfully"))
}

pub async fn show_media(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Path(media_id): Path<String>,
) -> Result<ApiResponse<MediaResponse>, AppError> {
    let media_id = parse_id(&media_id, MEDIA_NOT_FOUND)?;
    let media = media_service::find(&pool, media_id)
        .await?
        .ok_or_else(|| AppError::not_found(MEDIA_NOT_FOUND))?;

    let media = media_service::respond(&pool, &storage, media).await?;
    Ok(ApiResponse::ok(media, "Media retrieved successfully"))
}

/// Upload a media file.
///
/// # Endpoint
///
/// `POST /api/media` (`multipart/form-data`)
///
/// # Form Fields
///
/// - `name` (required): letters, digits, spaces and `- _ . , &`, at most 255 characters
/// - `file` (required): jpg, jpeg, png, mp4 or mov, at most 10 MB
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "status": "success",
///   "data": {
///     "id": 4,
///     "name": "Office photo",
///     "type": "image",
///     "file_path": "http://localhost:3000/storage/media/2025/01/9b1d....png",
///     "mime_type": "image/png",
///     "size": 48213,
///     "user": { "id": 1, "name": "Jane Admin", ... },
///     ...
///   },
///   "message": "Media uploaded successfully"
/// }
/// ```
pub async fn create_media(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<MediaResponse>, AppError> {
    policy::authorize(&auth, Resource::Media, Action::Create)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();

    let name = form.text("name").map(|v| v.trim().to_string());
    check_display_name(&mut errors, "name", "name", name.as_deref());

    let file = form.take_file("file");
    let detected = match &file {
        Some(file) => MEDIA_FILE.check("file", file, &mut errors),
        None => {
            errors.add("file", "The file field is required.");
            None
        }
    };

    errors.into_result()?;

    let (Some(name), Some(file), Some(detected)) = (name, file, detected) else {
        return Err(AppError::Internal("validated upload lost a field".into()));
    };

    let media = media_service::create(&pool, &storage, auth.user_id, &name, file, detected).await?;

    Ok(ApiResponse::created(media, "Media uploaded successfully"))
}

/// Update a media item.
///
/// # Endpoint
///
/// `PUT /api/media/{id}` (`multipart/form-data`)
///
/// `name` and `file` are both optional, but a `name` part that is sent must
/// not be empty. A new file replaces the stored object, which is deleted.
pub async fn update_media(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    Path(media_id): Path<String>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<MediaResponse>, AppError> {
    let media_id = parse_id(&media_id, MEDIA_NOT_FOUND)?;
    let media = media_service::find(&pool, media_id)
        .await?
        .ok_or_else(|| AppError::not_found(MEDIA_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Media, Action::Update)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();

    let name = if form.has_text("name") {
        let value = form.text("name").unwrap_or_default().trim().to_string();
        check_updated_name(&mut errors, "name", &value);
        Some(value)
    } else {
        None
    };

    let file = match form.take_file("file") {
        Some(file) => MEDIA_FILE
            .check("file", &file, &mut errors)
            .map(|detected| (file, detected)),
        None => None,
    };

    errors.into_result()?;

    if name.is_none() && file.is_none() {
        return Err(AppError::unprocessable("No data provided for update"));
    }

    let media = media_service::update(&pool, &storage, media, name, file).await?;

    Ok(ApiResponse::ok(media, "Media updated successfully"))
}

pub async fn delete_media(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    Path(media_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let media_id = parse_id(&media_id, MEDIA_NOT_FOUND)?;
    let media = media_service::find(&pool, media_id)
        .await?
        .ok_or_else(|| AppError::not_found(MEDIA_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Media, Action::Delete)?;

    media_service::delete(&pool, &storage, media).await?;

    Ok(ApiResponse::message("Media deleted successfully"))
}
