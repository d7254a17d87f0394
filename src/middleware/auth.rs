//! Bearer token authentication middleware.
//!
//! This middleware intercepts requests to:
//! 1. Extract the token from the Authorization header
//! 2. Hash its secret and look it up in `personal_access_tokens`
//! 3. Inject the authenticated user into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{
    db::DbPool,
    error::AppError,
    models::{access_token::PresentedToken, user::ROLE_ADMIN},
    services::auth_service,
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,

    /// Token used for this request; revoked by logout
    pub token_id: i64,

    pub name: String,

    pub email: String,

    /// `admin` or `user`
    pub role: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// The caller of a public endpoint: a user when a valid token was sent.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthContext>);

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(AuthContext::is_admin)
    }
}

/// Middleware for routes that require a logged-in user.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <id>|<secret>` header from request
/// 2. Hash the secret using SHA-256
/// 3. Look up the token (and its user) in the database
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn require_auth(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let auth_context = authenticate(&pool, header).await?;

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Middleware for public routes whose output depends on the caller.
///
/// No Authorization header means an anonymous viewer. A header that is
/// present but invalid is still rejected, so a client never silently
/// loses its admin view.
pub async fn optional_auth(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let viewer = match request.headers().get(AUTHORIZATION) {
        None => Viewer(None),
        Some(value) => {
            let header = value.to_str().map_err(|_| AppError::Unauthenticated)?;
            Viewer(Some(authenticate(&pool, header).await?))
        }
    };

    request.extensions_mut().insert(viewer);

    Ok(next.run(request).await)
}

/// Resolve an Authorization header value to its user.
async fn authenticate(pool: &DbPool, header: &str) -> Result<AuthContext, AppError> {
    // Expected format: "Bearer <token>"
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .and_then(PresentedToken::parse)
        .ok_or(AppError::Unauthenticated)?;

    auth_service::resolve_token(pool, &token)
        .await?
        .ok_or(AppError::Unauthenticated)
}
