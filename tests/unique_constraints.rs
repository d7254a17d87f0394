//! Writes that lose a race against the unique indexes report the field error
//! that the pre-insert checks would have given.

use std::sync::Arc;

use axum::body::Bytes;
use content_api_server::{
    error::AppError,
    models::team::NewTeam,
    services::{auth_service, role_service, team_service},
    storage::{MemoryDisk, SharedStorage},
    upload::{DetectedType, UploadedFile},
};
use sqlx::PgPool;

fn field_error(error: AppError, field: &str) -> String {
    match error {
        AppError::Validation(errors) => errors.get(field).expect("field error")[0].clone(),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

fn picture() -> UploadedFile {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(64, 0);
    UploadedFile {
        file_name: "member.jpg".to_string(),
        bytes: Bytes::from(bytes),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn second_registration_with_the_same_email_is_invalid(pool: PgPool) {
    auth_service::register(&pool, "First", "dup@example.com", "secret-password", "user")
        .await
        .unwrap();

    let error = auth_service::register(&pool, "Second", "dup@example.com", "secret-password", "user")
        .await
        .unwrap_err();

    assert_eq!(field_error(error, "email"), "The email has already been taken.");
}

#[sqlx::test(migrations = "./migrations")]
async fn second_team_entry_for_a_user_is_invalid(pool: PgPool) {
    auth_service::register(&pool, "Member", "member@example.com", "secret-password", "user")
        .await
        .unwrap();
    let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind("member@example.com")
        .fetch_one(&pool)
        .await
        .unwrap();

    let disk = Arc::new(MemoryDisk::new("http://files.test"));
    let storage: SharedStorage = disk.clone();
    let new_team = || NewTeam {
        name: "Jane Doe".to_string(),
        role_id: 1,
        bio: "Backend developer".to_string(),
        user_id,
    };

    team_service::create(&pool, &storage, new_team(), picture(), DetectedType::JPEG)
        .await
        .unwrap();
    let error = team_service::create(&pool, &storage, new_team(), picture(), DetectedType::JPEG)
        .await
        .unwrap_err();

    assert_eq!(
        field_error(error, "user_id"),
        "This user already has a team member entry."
    );
    // The losing insert's picture is discarded.
    assert_eq!(disk.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_role_names_are_invalid(pool: PgPool) {
    let error = role_service::create(&pool, "Developer", None).await.unwrap_err();

    assert_eq!(field_error(error, "name"), "The name has already been taken.");
}
