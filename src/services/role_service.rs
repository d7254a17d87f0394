//! Role service.

use crate::{db::DbPool, error::AppError, models::role::Role};

pub async fn list(pool: &DbPool) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_as::<_, Role>(
        r#"
        SELECT id, name, description, created_at, updated_at, deleted_at
        FROM roles
        WHERE deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

pub async fn find(pool: &DbPool, role_id: i64) -> Result<Option<Role>, AppError> {
    let role = sqlx::query_as::<_, Role>(
        r#"
        SELECT id, name, description, created_at, updated_at, deleted_at
        FROM roles
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(role_id)
    .fetch_optional(pool)
    .await?;

    Ok(role)
}

/// Whether any role row, soft-deleted included, already uses `name`.
///
/// The unique index covers deleted rows too, so they must count here.
pub async fn name_taken(pool: &DbPool, name: &str, except: Option<i64>) -> Result<bool, AppError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn create(pool: &DbPool, name: &str, description: Option<&str>) -> Result<Role, AppError> {
    let role = sqlx::query_as::<_, Role>(
        r#"
        INSERT INTO roles (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, created_at, updated_at, deleted_at
        "#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::unique_violation(e, "name", "The name has already been taken."))?;

    tracing::info!(role_id = role.id, name = %role.name, "Role created");
    Ok(role)
}

/// `description: Some(None)` clears the column; `None` leaves it.
pub async fn update(
    pool: &DbPool,
    role_id: i64,
    name: Option<String>,
    description: Option<Option<String>>,
) -> Result<Role, AppError> {
    let (set_description, description) = match description {
        Some(value) => (true, value),
        None => (false, None),
    };

    let role = sqlx::query_as::<_, Role>(
        r#"
        UPDATE roles
        SET name = COALESCE($2, name),
            description = CASE WHEN $3 THEN $4 ELSE description END,
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, name, description, created_at, updated_at, deleted_at
        "#,
    )
    .bind(role_id)
    .bind(name)
    .bind(set_description)
    .bind(description)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::unique_violation(e, "name", "The name has already been taken."))?
    .ok_or_else(|| AppError::not_found("Role not found"))?;

    tracing::info!(role_id = role.id, "Role updated");
    Ok(role)
}

/// Whether any team member row references the role, soft-deleted rows included.
pub async fn in_use(pool: &DbPool, role_id: i64) -> Result<bool, AppError> {
    let used: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE role_id = $1)")
        .bind(role_id)
        .fetch_one(pool)
        .await?;
    Ok(used)
}

pub async fn delete(pool: &DbPool, role_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE roles SET deleted_at = NOW() WHERE id = $1")
        .bind(role_id)
        .execute(pool)
        .await?;

    tracing::info!(role_id, "Role deleted");
    Ok(())
}
