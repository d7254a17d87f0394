//! Page service - queries and storage handling for pages.
//!
//! Banner replacement order: the new object is written first, then the row
//! is updated, then the old object is removed. A failed row update removes
//! the new object instead, so the disk never keeps an unreferenced banner.

use chrono::Utc;

use crate::{
    db::DbPool,
    error::AppError,
    models::page::{NewPage, Page, PageChanges, PageResponse},
    services::{files, relations},
    storage::SharedStorage,
    upload::{DetectedType, UploadedFile},
};

const BANNER_DIR: &str = "pages";

/// List pages newest first. Unpublished pages are only included for admins.
pub async fn list(
    pool: &DbPool,
    storage: &SharedStorage,
    include_unpublished: bool,
) -> Result<Vec<PageResponse>, AppError> {
    let pages = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, banner_type, banner_path, content, user_id, published_at, created_at, updated_at
        FROM pages
        WHERE $1 OR (published_at IS NOT NULL AND published_at <= NOW())
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(include_unpublished)
    .fetch_all(pool)
    .await?;

    let user_ids: Vec<i64> = pages.iter().map(|page| page.user_id).collect();
    let users = relations::load_users(pool, &user_ids).await?;

    Ok(pages
        .into_iter()
        .map(|page| {
            let url = storage.url(&page.banner_path);
            let user = users.get(&page.user_id).cloned();
            PageResponse::new(page, url, user)
        })
        .collect())
}

pub async fn find(pool: &DbPool, page_id: i64) -> Result<Option<Page>, AppError> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, banner_type, banner_path, content, user_id, published_at, created_at, updated_at
        FROM pages
        WHERE id = $1
        "#,
    )
    .bind(page_id)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

pub async fn find_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Page>, AppError> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, title, slug, banner_type, banner_path, content, user_id, published_at, created_at, updated_at
        FROM pages
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

/// Whether another page already uses `slug`.
pub async fn slug_taken(pool: &DbPool, slug: &str, except: Option<i64>) -> Result<bool, AppError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pages WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Store the banner and insert the page.
pub async fn create(
    pool: &DbPool,
    storage: &SharedStorage,
    user_id: i64,
    new_page: NewPage,
    banner: UploadedFile,
    detected: DetectedType,
) -> Result<PageResponse, AppError> {
    let stored = files::store(storage, BANNER_DIR, banner, detected).await?;

    let inserted = sqlx::query_as::<_, Page>(
        r#"
        INSERT INTO pages (title, slug, banner_type, banner_path, content, user_id, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, slug, banner_type, banner_path, content, user_id, published_at, created_at, updated_at
        "#,
    )
    .bind(&new_page.title)
    .bind(&new_page.slug)
    .bind(stored.detected.kind())
    .bind(&stored.key)
    .bind(&new_page.content)
    .bind(user_id)
    .bind(new_page.published_at)
    .fetch_one(pool)
    .await;

    let page = match inserted {
        Ok(page) => page,
        Err(e) => {
            files::discard(storage, &stored.key).await;
            return Err(AppError::unique_violation(
                e,
                "title",
                "A page with this title already exists.",
            ));
        }
    };

    tracing::info!(page_id = page.id, slug = %page.slug, "Page created");
    respond(pool, storage, page).await
}

/// Apply validated changes and an optional replacement banner.
pub async fn update(
    pool: &DbPool,
    storage: &SharedStorage,
    page: Page,
    changes: PageChanges,
    banner: Option<(UploadedFile, DetectedType)>,
) -> Result<PageResponse, AppError> {
    let stored = match banner {
        Some((file, detected)) => Some(files::store(storage, BANNER_DIR, file, detected).await?),
        None => None,
    };

    let (title, slug) = changes.title.unzip();
    let (set_published_at, published_at) = match changes.published_at {
        Some(value) => (true, value),
        None => (false, None),
    };

    let updated = sqlx::query_as::<_, Page>(
        r#"
        UPDATE pages
        SET title = COALESCE($2, title),
            slug = COALESCE($3, slug),
            content = COALESCE($4, content),
            published_at = CASE WHEN $5 THEN $6 ELSE published_at END,
            banner_path = COALESCE($7, banner_path),
            banner_type = COALESCE($8, banner_type),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, slug, banner_type, banner_path, content, user_id, published_at, created_at, updated_at
        "#,
    )
    .bind(page.id)
    .bind(title)
    .bind(slug)
    .bind(changes.content)
    .bind(set_published_at)
    .bind(published_at)
    .bind(stored.as_ref().map(|s| s.key.clone()))
    .bind(stored.as_ref().map(|s| s.detected.kind()))
    .fetch_one(pool)
    .await;

    let updated = match updated {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(stored) = &stored {
                files::discard(storage, &stored.key).await;
            }
            return Err(AppError::unique_violation(
                e,
                "title",
                "A page with this title already exists.",
            ));
        }
    };

    if stored.is_some() {
        files::discard(storage, &page.banner_path).await;
    }

    tracing::info!(page_id = updated.id, "Page updated");
    respond(pool, storage, updated).await
}

/// Remove the banner object (best effort) and delete the row.
pub async fn delete(pool: &DbPool, storage: &SharedStorage, page: Page) -> Result<(), AppError> {
    files::discard(storage, &page.banner_path).await;

    sqlx::query("DELETE FROM pages WHERE id = $1")
        .bind(page.id)
        .execute(pool)
        .await?;

    tracing::info!(page_id = page.id, "Page deleted");
    Ok(())
}

/// Whether `page` may be shown to a non-admin right now.
pub fn visible_to_public(page: &Page) -> bool {
    page.is_published(Utc::now())
}

/// Load the author and build the response body.
pub async fn respond(
    pool: &DbPool,
    storage: &SharedStorage,
    page: Page,
) -> Result<PageResponse, AppError> {
    let mut users = relations::load_users(pool, &[page.user_id]).await?;
    let user = users.remove(&page.user_id);
    let url = storage.url(&page.banner_path);
    Ok(PageResponse::new(page, url, user))
}
