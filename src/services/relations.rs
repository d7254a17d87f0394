//! Eager loading of the `user` and `role` objects embedded in responses.
//!
//! Lists load their relations with one `= ANY($1)` query per relation
//! instead of one query per row.

use std::collections::HashMap;

use crate::{
    db::DbPool,
    error::AppError,
    models::{role::Role, user::UserSummary},
};

pub async fn load_users(
    pool: &DbPool,
    ids: &[i64],
) -> Result<HashMap<i64, UserSummary>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role, created_at, updated_at FROM users WHERE id = ANY($1)",
    )
    .bind(dedup(ids))
    .fetch_all(pool)
    .await?;

    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

/// Live (not soft-deleted) roles by id.
pub async fn load_roles(pool: &DbPool, ids: &[i64]) -> Result<HashMap<i64, Role>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let roles = sqlx::query_as::<_, Role>(
        r#"
        SELECT id, name, description, created_at, updated_at, deleted_at
        FROM roles
        WHERE id = ANY($1) AND deleted_at IS NULL
        "#,
    )
    .bind(dedup(ids))
    .fetch_all(pool)
    .await?;

    Ok(roles.into_iter().map(|role| (role.id, role)).collect())
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_sorts_and_removes_repeats() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
    }
}
