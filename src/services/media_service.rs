//! Media service - the media library.
//!
//! Deletes are soft: the row keeps a `deleted_at` timestamp while the stored
//! object is removed.

use crate::{
    db::DbPool,
    error::AppError,
    models::media::{Media, MediaResponse},
    services::{files, relations},
    storage::SharedStorage,
    upload::{DetectedType, UploadedFile},
};

const MEDIA_DIR: &str = "media";

/// List live media newest first.
pub async fn list(pool: &DbPool, storage: &SharedStorage) -> Result<Vec<MediaResponse>, AppError> {
    let items = sqlx::query_as::<_, Media>(
        r#"
        SELECT id, name, type, file_path, mime_type, size, user_id, created_at, updated_at, deleted_at
        FROM media
        WHERE deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let user_ids: Vec<i64> = items.iter().map(|item| item.user_id).collect();
    let users = relations::load_users(pool, &user_ids).await?;

    let mut responses = Vec::with_capacity(items.len());
    for item in items {
        let url = files::visible_url(storage, &item.file_path, "media", item.id).await;
        let user = users.get(&item.user_id).cloned();
        responses.push(MediaResponse::new(item, url, user));
    }

    Ok(responses)
}

pub async fn find(pool: &DbPool, media_id: i64) -> Result<Option<Media>, AppError> {
    let media = sqlx::query_as::<_, Media>(
        r#"
        SELECT id, name, type, file_path, mime_type, size, user_id, created_at, updated_at, deleted_at
        FROM media
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(media_id)
    .fetch_optional(pool)
    .await?;

    Ok(media)
}

/// Store the file and insert the media row.
pub async fn create(
    pool: &DbPool,
    storage: &SharedStorage,
    user_id: i64,
    name: &str,
    file: UploadedFile,
    detected: DetectedType,
) -> Result<MediaResponse, AppError> {
    let stored = files::store(storage, MEDIA_DIR, file, detected).await?;

    let inserted = sqlx::query_as::<_, Media>(
        r#"
        INSERT INTO media (name, type, file_path, mime_type, size, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, type, file_path, mime_type, size, user_id, created_at, updated_at, deleted_at
        "#,
    )
    .bind(name)
    .bind(stored.detected.kind())
    .bind(&stored.key)
    .bind(stored.detected.mime)
    .bind(stored.size)
    .bind(user_id)
    .fetch_one(pool)
    .await;

    let media = match inserted {
        Ok(media) => media,
        Err(e) => {
            files::discard(storage, &stored.key).await;
            return Err(e.into());
        }
    };

    tracing::info!(media_id = media.id, kind = %media.kind, size = media.size, "Media uploaded");
    respond(pool, storage, media).await
}

/// Rename and/or replace the file of a media item.
///
/// A replaced object is removed from the disk once the row points at the new one.
pub async fn update(
    pool: &DbPool,
    storage: &SharedStorage,
    media: Media,
    name: Option<String>,
    file: Option<(UploadedFile, DetectedType)>,
) -> Result<MediaResponse, AppError> {
    let stored = match file {
        Some((file, detected)) => Some(files::store(storage, MEDIA_DIR, file, detected).await?),
        None => None,
    };

    let updated = sqlx::query_as::<_, Media>(
        r#"
        UPDATE media
        SET name = COALESCE($2, name),
            file_path = COALESCE($3, file_path),
            type = COALESCE($4, type),
            mime_type = COALESCE($5, mime_type),
            size = COALESCE($6, size),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, name, type, file_path, mime_type, size, user_id, created_at, updated_at, deleted_at
        "#,
    )
    .bind(media.id)
    .bind(name)
    .bind(stored.as_ref().map(|s| s.key.clone()))
    .bind(stored.as_ref().map(|s| s.detected.kind()))
    .bind(stored.as_ref().map(|s| s.detected.mime))
    .bind(stored.as_ref().map(|s| s.size))
    .fetch_optional(pool)
    .await;

    let updated = match updated {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            if let Some(stored) = &stored {
                files::discard(storage, &stored.key).await;
            }
            return Err(AppError::not_found("Media not found"));
        }
        Err(e) => {
            if let Some(stored) = &stored {
                files::discard(storage, &stored.key).await;
            }
            return Err(e.into());
        }
    };

    if stored.is_some() {
        files::discard(storage, &media.file_path).await;
    }

    tracing::info!(media_id = updated.id, "Media updated");
    respond(pool, storage, updated).await
}

/// Remove the object (best effort) and soft-delete the row.
pub async fn delete(pool: &DbPool, storage: &SharedStorage, media: Media) -> Result<(), AppError> {
    files::discard(storage, &media.file_path).await;

    sqlx::query("UPDATE media SET deleted_at = NOW() WHERE id = $1")
        .bind(media.id)
        .execute(pool)
        .await?;

    tracing::info!(media_id = media.id, "Media deleted");
    Ok(())
}

/// Load the uploader and build the response body.
pub async fn respond(
    pool: &DbPool,
    storage: &SharedStorage,
    media: Media,
) -> Result<MediaResponse, AppError> {
    let mut users = relations::load_users(pool, &[media.user_id]).await?;
    let user = users.remove(&media.user_id);
    let url = files::visible_url(storage, &media.file_path, "media", media.id).await;
    Ok(MediaResponse::new(media, url, user))
}
