//! User accounts.
//!
//! Users are created through `/api/register` and are either `admin` or `user`.
//! Only admins may create, update or delete content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. `password` holds a bcrypt hash and never
/// leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    /// `admin` or `user` (enforced by a CHECK constraint)
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, embedded in pages, media and team members.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/register`.
///
/// Every field is optional at the type level so that missing fields are
/// reported as validation errors rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Request body for `POST /api/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body returned by register and login.
///
/// ```json
/// { "token": "12|Xb3p...40 chars" }
/// ```
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
