//! Authentication HTTP handlers.
//!
//! - POST /api/register - Create a user and return its first token
//! - POST /api/login - Exchange credentials for a token
//! - POST /api/logout - Revoke the current token
//! - GET /api/user - The authenticated user

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    db::DbPool,
    error::{AppError, ValidationErrors},
    handlers::json_body,
    middleware::auth::AuthContext,
    models::user::{LoginRequest, ROLE_ADMIN, ROLE_USER, RegisterRequest, TokenResponse, UserSummary},
    services::auth_service,
    validation::{MAX_NAME_CHARS, is_email},
};

const MIN_PASSWORD_CHARS: usize = 8;

/// Register a new user.
///
/// # Endpoint
///
/// `POST /api/register`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Jane Admin",
///   "email": "jane@example.com",
///   "password": "securepassword",
///   "role": "admin"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{ "token": "1|..." }`
/// - **Error (422)**: Validation failed (e.g. e-mail already taken)
pub async fn register(
    State(pool): State<DbPool>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let request = json_body(body)?;
    let mut errors = ValidationErrors::new();

    let name = present(request.name.as_deref());
    match name {
        None => errors.add("name", "The name field is required."),
        Some(name) if name.chars().count() > MAX_NAME_CHARS => errors.add(
            "name",
            format!("The name field must not be greater than {MAX_NAME_CHARS} characters."),
        ),
        Some(_) => {}
    }

    let email = present(request.email.as_deref());
    match email {
        None => errors.add("email", "The email field is required."),
        Some(email) if !is_email(email) => {
            errors.add("email", "The email field must be a valid email address.")
        }
        Some(email) => {
            if auth_service::email_taken(&pool, email).await? {
                errors.add("email", "The email has already been taken.");
            }
        }
    }

    let password = present(request.password.as_deref());
    match password {
        None => errors.add("password", "The password field is required."),
        Some(password) if password.chars().count() < MIN_PASSWORD_CHARS => errors.add(
            "password",
            format!("The password field must be at least {MIN_PASSWORD_CHARS} characters."),
        ),
        Some(_) => {}
    }

    let role = present(request.role.as_deref());
    match role {
        None => errors.add("role", "The role field is required."),
        Some(role) if role != ROLE_ADMIN && role != ROLE_USER => {
            errors.add("role", "The selected role is invalid.")
        }
        Some(_) => {}
    }

    errors.into_result()?;

    // All four are present once validation passed
    let (Some(name), Some(email), Some(password), Some(role)) = (name, email, password, role)
    else {
        return Err(AppError::Internal("validated registration lost a field".into()));
    };

    let token = auth_service::register(&pool, name, email, password, role).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Log in with e-mail and password.
///
/// # Endpoint
///
/// `POST /api/login`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "token": "2|..." }`
/// - **Error (401)**: `Invalid credentials`
/// - **Error (422)**: Missing or malformed fields
pub async fn login(
    State(pool): State<DbPool>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let request = json_body(body)?;
    let mut errors = ValidationErrors::new();

    let email = present(request.email.as_deref());
    match email {
        None => errors.add("email", "The email field is required."),
        Some(email) if !is_email(email) => {
            errors.add("email", "The email field must be a valid email address.")
        }
        Some(_) => {}
    }

    let password = present(request.password.as_deref());
    if password.is_none() {
        errors.add("password", "The password field is required.");
    }

    errors.into_result()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Internal("validated login lost a field".into()));
    };

    let token = auth_service::login(&pool, email, password).await?;

    Ok(Json(TokenResponse { token }))
}

/// Revoke the token that authenticated this request. Returns 204.
pub async fn logout(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&pool, &auth).await?;
    tracing::info!(user_id = auth.user_id, token_id = auth.token_id, "Token revoked");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/user`
pub async fn current_user(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserSummary>, AppError> {
    let user = auth_service::find_user(&pool, auth.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    Ok(Json(user))
}

/// Blank strings count as missing.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
