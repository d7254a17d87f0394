//! Team roles (Developer, Designer, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Represents a role record from the database.
///
/// Roles are soft-deleted (`deleted_at`) and cannot be removed while any
/// team member references them.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /api/roles`.
///
/// ```json
/// { "name": "QA Engineer", "description": "Quality assurance" }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CreateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for `PUT /api/roles/{id}`.
///
/// Both fields are "sometimes" rules: absent fields are left untouched.
/// `description` distinguishes an absent key from an explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,

    #[serde(default, deserialize_with = "explicit_option")]
    pub description: Option<Option<String>>,
}

/// `Some(None)` for `null`, `None` when the key is missing.
fn explicit_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let missing: UpdateRoleRequest = serde_json::from_str(r#"{"name":"QA"}"#).unwrap();
        assert_eq!(missing.description, None);

        let cleared: UpdateRoleRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateRoleRequest =
            serde_json::from_str(r#"{"description":"Testers"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Testers".to_string())));
    }
}
