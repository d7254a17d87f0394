//! Media library items (uploaded images and videos).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::user::UserSummary;

/// Represents a media record from the database.
///
/// Media rows are soft-deleted; every read filters on `deleted_at IS NULL`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Media {
    pub id: i64,
    pub name: String,
    /// `image` or `video`
    #[sqlx(rename = "type")]
    pub kind: String,
    /// Object key on the storage disk
    pub file_path: String,
    pub mime_type: String,
    /// Size in bytes
    pub size: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Response body for media endpoints.
///
/// `file_path` is the public URL, or `null` when the object is gone from the disk.
#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file_path: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user: Option<UserSummary>,
}

impl MediaResponse {
    pub fn new(media: Media, file_url: Option<String>, user: Option<UserSummary>) -> Self {
        Self {
            id: media.id,
            name: media.name,
            kind: media.kind,
            file_path: file_url,
            mime_type: media.mime_type,
            size: media.size,
            created_at: media.created_at,
            updated_at: media.updated_at,
            deleted_at: media.deleted_at,
            user,
        }
    }
}
