//! Page data models and API response types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::user::UserSummary;

/// Represents a page record from the database.
///
/// # Database Table
///
/// Maps to the `pages` table. Each page:
/// - Is addressed publicly by its unique `slug` (derived from the title)
/// - Has a banner image or video stored on the disk under `banner_path`
/// - Is visible to the public once `published_at` is in the past
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// `image` or `video`
    pub banner_type: String,
    /// Object key of the banner on the storage disk
    pub banner_path: String,
    pub content: String,
    /// Author; hidden from responses, exposed through `user`
    pub user_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.published_at.is_some_and(|at| at <= now)
    }
}

/// Response body for page endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "title": "About Us",
///   "slug": "about-us",
///   "banner_type": "image",
///   "banner_path": "https://bucket.s3.ap-southeast-1.amazonaws.com/pages/2025/02/8c0e....jpg",
///   "content": "We build things.",
///   "published_at": "2025-02-01T10:00:00Z",
///   "created_at": "2025-02-01T09:00:00Z",
///   "updated_at": "2025-02-01T09:00:00Z",
///   "user": { "id": 1, "name": "Admin", ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub banner_type: String,
    /// Public URL of the banner
    pub banner_path: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
}

impl PageResponse {
    pub fn new(page: Page, banner_url: String, user: Option<UserSummary>) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            banner_type: page.banner_type,
            banner_path: banner_url,
            content: page.content,
            published_at: page.published_at,
            created_at: page.created_at,
            updated_at: page.updated_at,
            user,
        }
    }
}

/// Validated input for creating a page.
#[derive(Debug)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Validated partial update. `None` leaves a column untouched.
#[derive(Debug, Default)]
pub struct PageChanges {
    pub title: Option<(String, String)>,
    pub content: Option<String>,
    /// `Some(None)` clears the publication date.
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl PageChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn page(published_at: Option<DateTime<Utc>>) -> Page {
        let now = Utc::now();
        Page {
            id: 1,
            title: "About".into(),
            slug: "about".into(),
            banner_type: "image".into(),
            banner_path: "pages/2025/01/a.jpg".into(),
            content: "Body".into(),
            user_id: 1,
            published_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn publication_window() {
        let now = Utc::now();
        assert!(page(Some(now - Duration::hours(1))).is_published(now));
        assert!(!page(Some(now + Duration::hours(1))).is_published(now));
        assert!(!page(None).is_published(now));
    }

    #[test]
    fn response_hides_author_id_and_uses_url() {
        let response = PageResponse::new(page(None), "http://cdn/a.jpg".into(), None);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["banner_path"], "http://cdn/a.jpg");
        assert!(value.get("user_id").is_none());
    }
}
