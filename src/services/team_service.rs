//! Team service - team member profiles.
//!
//! Members are soft-deleted and their pictures stay on disk, both on delete
//! and when a new picture replaces the old one.

use crate::{
    db::DbPool,
    error::AppError,
    models::team::{NewTeam, Team, TeamChanges, TeamResponse},
    services::{files, relations},
    storage::SharedStorage,
    upload::{DetectedType, UploadedFile},
};

const PICTURE_DIR: &str = "teams";

/// List live members newest first with their user and role.
pub async fn list(pool: &DbPool, storage: &SharedStorage) -> Result<Vec<TeamResponse>, AppError> {
    let members = sqlx::query_as::<_, Team>(
        r#"
        SELECT id, name, role_id, bio, profile_picture, user_id, created_at, updated_at, deleted_at
        FROM teams
        WHERE deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let user_ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
    let role_ids: Vec<i64> = members.iter().map(|m| m.role_id).collect();
    let users = relations::load_users(pool, &user_ids).await?;
    let roles = relations::load_roles(pool, &role_ids).await?;

    let mut responses = Vec::with_capacity(members.len());
    for member in members {
        let url = files::visible_url(storage, &member.profile_picture, "team", member.id).await;
        let user = users.get(&member.user_id).cloned();
        let role = roles.get(&member.role_id).cloned();
        responses.push(TeamResponse::new(member, url, user, role));
    }

    Ok(responses)
}

pub async fn find(pool: &DbPool, team_id: i64) -> Result<Option<Team>, AppError> {
    let member = sqlx::query_as::<_, Team>(
        r#"
        SELECT id, name, role_id, bio, profile_picture, user_id, created_at, updated_at, deleted_at
        FROM teams
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

/// Whether a live role with this id exists.
pub async fn role_exists(pool: &DbPool, role_id: i64) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(role_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn user_exists(pool: &DbPool, user_id: i64) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Whether the user already has a live member entry.
pub async fn user_has_team(pool: &DbPool, user_id: i64) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE user_id = $1 AND deleted_at IS NULL)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Store the picture and insert the member.
pub async fn create(
    pool: &DbPool,
    storage: &SharedStorage,
    new_team: NewTeam,
    picture: UploadedFile,
    detected: DetectedType,
) -> Result<TeamResponse, AppError> {
    let stored = files::store(storage, PICTURE_DIR, picture, detected).await?;

    let inserted = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (name, role_id, bio, profile_picture, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, role_id, bio, profile_picture, user_id, created_at, updated_at, deleted_at
        "#,
    )
    .bind(&new_team.name)
    .bind(new_team.role_id)
    .bind(&new_team.bio)
    .bind(&stored.key)
    .bind(new_team.user_id)
    .fetch_one(pool)
    .await;

    let member = match inserted {
        Ok(member) => member,
        Err(e) => {
            files::discard(storage, &stored.key).await;
            return Err(AppError::unique_violation(
                e,
                "user_id",
                "This user already has a team member entry.",
            ));
        }
    };

    tracing::info!(team_id = member.id, user_id = member.user_id, "Team member created");
    respond(pool, storage, member).await
}

/// Apply validated changes and an optional new picture.
pub async fn update(
    pool: &DbPool,
    storage: &SharedStorage,
    member: Team,
    changes: TeamChanges,
    picture: Option<(UploadedFile, DetectedType)>,
) -> Result<TeamResponse, AppError> {
    let stored = match picture {
        Some((file, detected)) => Some(files::store(storage, PICTURE_DIR, file, detected).await?),
        None => None,
    };

    let updated = sqlx::query_as::<_, Team>(
        r#"
        UPDATE teams
        SET name = COALESCE($2, name),
            role_id = COALESCE($3, role_id),
            bio = COALESCE($4, bio),
            profile_picture = COALESCE($5, profile_picture),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, name, role_id, bio, profile_picture, user_id, created_at, updated_at, deleted_at
        "#,
    )
    .bind(member.id)
    .bind(changes.name)
    .bind(changes.role_id)
    .bind(changes.bio)
    .bind(stored.as_ref().map(|s| s.key.clone()))
    .fetch_optional(pool)
    .await;

    let updated = match updated {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            if let Some(stored) = &stored {
                files::discard(storage, &stored.key).await;
            }
            return Err(AppError::not_found("Team member not found"));
        }
        Err(e) => {
            if let Some(stored) = &stored {
                files::discard(storage, &stored.key).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(team_id = updated.id, "Team member updated");
    respond(pool, storage, updated).await
}

pub async fn delete(pool: &DbPool, member: Team) -> Result<(), AppError> {
    sqlx::query("UPDATE teams SET deleted_at = NOW() WHERE id = $1")
        .bind(member.id)
        .execute(pool)
        .await?;

    tracing::info!(team_id = member.id, "Team member deleted");
    Ok(())
}

/// Load the user and role and build the response body.
pub async fn respond(
    pool: &DbPool,
    storage: &SharedStorage,
    member: Team,
) -> Result<TeamResponse, AppError> {
    let mut users = relations::load_users(pool, &[member.user_id]).await?;
    let mut roles = relations::load_roles(pool, &[member.role_id]).await?;
    let user = users.remove(&member.user_id);
    let role = roles.remove(&member.role_id);
    let url = files::visible_url(storage, &member.profile_picture, "team", member.id).await;
    Ok(TeamResponse::new(member, url, user, role))
}
