//! Team member profiles.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{role::Role, user::UserSummary};

/// Represents a team member record from the database.
///
/// Each member belongs to one user (at most one live entry per user) and
/// one role. Deleting a member is a soft delete that keeps the picture.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    pub bio: String,
    /// Object key of the profile picture
    pub profile_picture: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Response body for team endpoints. `role_id` and `user_id` are replaced
/// by the embedded `role` and `user`.
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user: Option<UserSummary>,
    pub role: Option<Role>,
}

impl TeamResponse {
    pub fn new(
        team: Team,
        picture_url: Option<String>,
        user: Option<UserSummary>,
        role: Option<Role>,
    ) -> Self {
        Self {
            id: team.id,
            name: team.name,
            bio: team.bio,
            profile_picture: picture_url,
            created_at: team.created_at,
            updated_at: team.updated_at,
            deleted_at: team.deleted_at,
            user,
            role,
        }
    }
}

/// Validated input for creating a team member.
#[derive(Debug)]
pub struct NewTeam {
    pub name: String,
    pub role_id: i64,
    pub bio: String,
    pub user_id: i64,
}

/// Validated partial update.
#[derive(Debug, Default)]
pub struct TeamChanges {
    pub name: Option<String>,
    pub role_id: Option<i64>,
    pub bio: Option<String>,
}

impl TeamChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role_id.is_none() && self.bio.is_none()
    }
}
