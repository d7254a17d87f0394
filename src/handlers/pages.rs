//! Page HTTP handlers.
//!
//! - GET /api/pages - List pages (published only, unless the caller is an admin)
//! - GET /api/pages/{slug} - Get a page by slug
//! - POST /api/pages - Create a page (admin, multipart)
//! - PUT /api/pages/{id} - Update a page (admin, multipart, partial)
//! - DELETE /api/pages/{id} - Delete a page and its banner (admin)

use axum::{
    Extension,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};

use crate::{
    db::DbPool,
    error::{AppError, ValidationErrors},
    handlers::{form_body, parse_id},
    middleware::auth::{AuthContext, Viewer},
    models::page::{NewPage, PageChanges, PageResponse},
    policy::{self, Action, Resource},
    response::ApiResponse,
    services::page_service,
    storage::SharedStorage,
    upload::MEDIA_FILE,
    validation::{
        MAX_NAME_CHARS, MAX_SLUG_BYTES, check_display_name, has_control_chars, is_display_name,
        is_slug, parse_flexible_timestamp, parse_strict_timestamp, slugify,
    },
};

const PAGE_NOT_FOUND: &str = "Page not found";
const BINARY_CONTENT: &str = "Content contains invalid characters or binary data";

/// List pages, newest first.
///
/// # Endpoint
///
/// `GET /api/pages`
///
/// # Authentication
///
/// Optional. Admins also see drafts and pages scheduled for later.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "success",
///   "data": [
///     {
///       "id": 1,
///       "title": "About Us",
///       "slug": "about-us",
///       "banner_type": "image",
///       "banner_path": "http://localhost:3000/storage/pages/2025/01/3f6c....jpg",
///       "content": "<p>Company content</p>",
///       "published_at": "2025-01-20T09:00:00Z",
///       "created_at": "2025-01-19T10:00:00Z",
///       "updated_at": "2025-01-19T10:00:00Z",
///       "user": { "id": 1, "name": "Jane Admin", ... }
///     }
///   ],
///   "message": "Pages retrieved successfully"
/// }
/// ```
pub async fn list_pages(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<Vec<PageResponse>>, AppError> {
    let pages = page_service::list(&pool, &storage, viewer.is_admin()).await?;

    Ok(ApiResponse::ok(pages, "Pages retrieved successfully"))
}

/// Get a page by slug.
///
/// # Endpoint
///
/// `GET /api/pages/{slug}`
///
/// # Response
///
/// - **Success (200 OK)**: The page
/// - **Error (422)**: Malformed slug
/// - **Error (404)**: Unknown slug, or not yet published and the caller is not an admin
pub async fn show_page(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<PageResponse>, AppError> {
    if slug.is_empty() {
        return Err(AppError::invalid_field("slug", "The slug is required"));
    }
    if !is_slug(&slug) {
        return Err(AppError::invalid_field("slug", "Invalid slug format"));
    }
    if slug.len() > MAX_SLUG_BYTES {
        return Err(AppError::invalid_field("slug", "The slug is too long"));
    }

    let page = page_service::find_by_slug(&pool, &slug)
        .await?
        .filter(|page| viewer.is_admin() || page_service::visible_to_public(page))
        .ok_or_else(|| AppError::not_found(PAGE_NOT_FOUND))?;

    let page = page_service::respond(&pool, &storage, page).await?;
    Ok(ApiResponse::ok(page, "Page retrieved successfully"))
}

/// Create a page.
///
/// # Endpoint
///
/// `POST /api/pages` (`multipart/form-data`)
///
/// # Form Fields
///
/// - `title` (required): letters, digits, spaces and `- _ . , &`; must give a new slug
/// - `content` (required): text without control characters
/// - `banner` (required): jpg, jpeg, png, mp4 or mov, at most 10 MB
/// - `published_at` (optional): `YYYY-MM-DDTHH:MM:SSZ`
///
/// # Response
///
/// - **Success (201 Created)**: The page, with `banner_path` as a URL
/// - **Error (403)**: Caller is not an admin
/// - **Error (422)**: Validation failed
pub async fn create_page(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<PageResponse>, AppError> {
    policy::authorize(&auth, Resource::Page, Action::Create)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();

    let title = form.text("title").map(|t| t.trim().to_string());
    check_display_name(&mut errors, "title", "title", title.as_deref());
    let slug = title.as_deref().map(slugify).unwrap_or_default();
    if title.as_deref().is_some_and(|t| !t.is_empty()) {
        if slug.is_empty() {
            errors.add(
                "title",
                "The title must contain at least one alphanumeric character.",
            );
        } else if page_service::slug_taken(&pool, &slug, None).await? {
            errors.add("title", "A page with this title already exists.");
        }
    }

    let content = form
        .text("content")
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if form.is_binary("content") {
        errors.add("content", BINARY_CONTENT);
    } else if form.has_file("content") {
        errors.add("content", "The content field must be a string.");
    } else {
        match content.as_deref() {
            None => errors.add("content", "The content field is required."),
            Some(c) if has_control_chars(c) => errors.add("content", BINARY_CONTENT),
            Some(_) => {}
        }
    }

    let published_at = match form.text("published_at").filter(|v| !v.is_empty()) {
        None => None,
        Some(value) => {
            let parsed = parse_strict_timestamp(value);
            if parsed.is_none() {
                errors.add("published_at", "The published at date format is invalid.");
            }
            parsed
        }
    };

    let banner = form.take_file("banner");
    let detected = match &banner {
        Some(file) => MEDIA_FILE.check("banner", file, &mut errors),
        None => {
            errors.add("banner", "The banner field is required.");
            None
        }
    };

    errors.into_result()?;

    let (Some(title), Some(content), Some(banner), Some(detected)) =
        (title, content, banner, detected)
    else {
        return Err(AppError::Internal("validated page lost a field".into()));
    };

    let new_page = NewPage {
        title,
        slug,
        content,
        published_at,
    };
    let page = page_service::create(&pool, &storage, auth.user_id, new_page, banner, detected)
        .await?;

    Ok(ApiResponse::created(page, "Page created successfully"))
}

/// Update a page.
///
/// # Endpoint
///
/// `PUT /api/pages/{id}` (`multipart/form-data`)
///
/// Every field is optional. Empty `title` and `content` values are ignored;
/// an empty `published_at` unpublishes the page. A new `banner` replaces the
/// stored one, which is then deleted.
///
/// # Response
///
/// - **Success (200 OK)**: The updated page
/// - **Error (404)**: Unknown page
/// - **Error (403)**: Caller is not an admin
/// - **Error (422)**: Validation failed, or nothing to update
pub async fn update_page(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    Path(page_id): Path<String>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<PageResponse>, AppError> {
    let page_id = parse_id(&page_id, PAGE_NOT_FOUND)?;
    let page = page_service::find(&pool, page_id)
        .await?
        .ok_or_else(|| AppError::not_found(PAGE_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Page, Action::Update)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();
    let mut changes = PageChanges::default();

    if let Some(title) = form.text("title").map(str::trim).filter(|t| !t.is_empty()) {
        if title.chars().count() > MAX_NAME_CHARS {
            errors.add(
                "title",
                format!("The title must not exceed {MAX_NAME_CHARS} characters"),
            );
        } else if !is_display_name(title) {
            errors.add("title", "The title contains invalid characters");
        } else {
            let slug = slugify(title);
            if slug.is_empty() {
                errors.add(
                    "title",
                    "The title must contain at least one alphanumeric character",
                );
            } else if page_service::slug_taken(&pool, &slug, Some(page.id)).await? {
                errors.add("title", "A page with this title already exists.");
            } else {
                changes.title = Some((title.to_string(), slug));
            }
        }
    }

    if form.has_file("content") {
        errors.add("content", "Content field cannot be a file");
    } else if form.is_binary("content") {
        errors.add("content", BINARY_CONTENT);
    } else if let Some(content) = form.text("content").filter(|c| !c.is_empty()) {
        if has_control_chars(content) {
            errors.add("content", BINARY_CONTENT);
        } else {
            changes.content = Some(content.to_string());
        }
    }

    if let Some(value) = form.text("published_at") {
        if value.trim().is_empty() {
            changes.published_at = Some(None);
        } else {
            match parse_flexible_timestamp(value) {
                Some(parsed) => changes.published_at = Some(Some(parsed)),
                None => errors.add("published_at", "Invalid date format"),
            }
        }
    }

    let banner = match form.take_file("banner") {
        Some(file) => MEDIA_FILE
            .check("banner", &file, &mut errors)
            .map(|detected| (file, detected)),
        None => None,
    };

    errors.into_result()?;

    if changes.is_empty() && banner.is_none() {
        return Err(AppError::unprocessable("No data provided for update"));
    }

    let page = page_service::update(&pool, &storage, page, changes, banner).await?;

    Ok(ApiResponse::ok(page, "Page updated successfully"))
}

/// Delete a page.
///
/// # Endpoint
///
/// `DELETE /api/pages/{id}`
///
/// The banner object is removed first; a missing object or a storage
/// failure is logged and does not stop the delete.
pub async fn delete_page(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    Path(page_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let page_id = parse_id(&page_id, PAGE_NOT_FOUND)?;
    let page = page_service::find(&pool, page_id)
        .await?
        .ok_or_else(|| AppError::not_found(PAGE_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Page, Action::Delete)?;

    page_service::delete(&pool, &storage, page).await?;

    Ok(ApiResponse::message("Page deleted successfully"))
}
