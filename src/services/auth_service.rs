//! Authentication service - users, password hashing and access tokens.
//!
//! # Tokens
//!
//! A new token is `<row id>|<40 random alphanumerics>`. The database keeps
//! only the SHA-256 hex digest of the random part, so a leaked table does
//! not leak usable credentials.

use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        access_token::PresentedToken,
        user::{User, UserSummary},
    },
};

const TOKEN_NAME: &str = "auth_token";
const TOKEN_SECRET_LEN: usize = 40;

/// Create a user and issue its first token.
///
/// The caller has already validated the input and checked the e-mail is free.
/// A concurrent registration that wins the race still gets the e-mail error.
pub async fn register(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<String, AppError> {
    let password_hash = hash_password(password.to_string()).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, password, role, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::unique_violation(e, "email", "The email has already been taken."))?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    issue_token(pool, user.id).await
}

/// Check credentials and issue a new token.
///
/// # Errors
///
/// - `InvalidCredentials`: unknown e-mail or wrong password
pub async fn login(pool: &DbPool, email: &str, password: &str) -> Result<String, AppError> {
    let user = find_user_by_email(pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password.to_string(), user.password.clone()).await? {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    issue_token(pool, user.id).await
}

/// Revoke the token used for the current request.
pub async fn logout(pool: &DbPool, auth: &AuthContext) -> Result<(), AppError> {
    sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1 AND user_id = $2")
        .bind(auth.token_id)
        .bind(auth.user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn email_taken(pool: &DbPool, email: &str) -> Result<bool, AppError> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(taken)
}

pub async fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user(pool: &DbPool, user_id: i64) -> Result<Option<UserSummary>, AppError> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

#[derive(sqlx::FromRow)]
struct TokenOwner {
    token_id: i64,
    user_id: i64,
    name: String,
    email: String,
    role: String,
}

/// Look up the user behind a presented bearer token.
///
/// Returns `None` when the digest is unknown or the id prefix does not match.
pub async fn resolve_token(
    pool: &DbPool,
    token: &PresentedToken<'_>,
) -> Result<Option<AuthContext>, AppError> {
    let digest = hash_token(token.secret);

    let owner = sqlx::query_as::<_, TokenOwner>(
        r#"
        SELECT t.id AS token_id, u.id AS user_id, u.name, u.email, u.role
        FROM personal_access_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token = $1 AND ($2::BIGINT IS NULL OR t.id = $2)
        "#,
    )
    .bind(&digest)
    .bind(token.id)
    .fetch_optional(pool)
    .await?;

    let Some(owner) = owner else {
        return Ok(None);
    };

    sqlx::query("UPDATE personal_access_tokens SET last_used_at = NOW() WHERE id = $1")
        .bind(owner.token_id)
        .execute(pool)
        .await?;

    Ok(Some(AuthContext {
        user_id: owner.user_id,
        token_id: owner.token_id,
        name: owner.name,
        email: owner.email,
        role: owner.role,
    }))
}

/// Store a new token for `user_id` and return its plaintext form.
async fn issue_token(pool: &DbPool, user_id: i64) -> Result<String, AppError> {
    let secret = generate_token_secret();

    let token_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO personal_access_tokens (user_id, name, token)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(TOKEN_NAME)
    .bind(hash_token(&secret))
    .fetch_one(pool)
    .await?;

    Ok(format!("{token_id}|{secret}"))
}

/// SHA-256 hex digest stored for a token secret.
pub fn hash_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_token_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// bcrypt is CPU-bound, so it runs on the blocking pool.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password check failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_secrets_are_alphanumeric() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), TOKEN_SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_token_secret());
    }

    #[test]
    fn token_digest_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn passwords_round_trip_through_bcrypt() {
        let hash = hash_password("securepassword".to_string()).await.unwrap();
        assert!(verify_password("securepassword".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
