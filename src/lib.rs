//! Content API Server
//!
//! A REST API for a small content-management backend: pages, a media
//! library, team members and their roles. Anyone can read published
//! content; admins authenticated with a bearer token manage it.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: personal access tokens, stored as SHA-256 digests
//! - **Files**: pluggable object storage (local disk, S3, in-memory)
//! - **Format**: JSON responses, multipart uploads

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod response;
pub mod services;
pub mod state;
pub mod storage;
pub mod upload;
pub mod validation;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::Config,
    handlers::{auth, health, media, pages, roles, teams},
    middleware::auth::{optional_auth, require_auth},
    state::AppState,
};

/// Build the HTTP router.
///
/// # Route Groups
///
/// - Open: `/health`, `/api/register`, `/api/login`
/// - Public reads (optional token): `GET` on pages, media, teams and roles
/// - Authenticated (token required): logout, current user and every write
///
/// Local and in-memory disk files are served under `/storage`.
pub fn app(state: AppState, config: &Config) -> Router {
    let pool = state.pool.clone();

    // Reads whose result may depend on who is asking
    let public_routes: Router<AppState> = Router::new()
        .route("/api/pages", get(pages::list_pages))
        .route("/api/pages/{page}", get(pages::show_page))
        .route("/api/media", get(media::list_media))
        .route("/api/media/{id}", get(media::show_media))
        .route("/api/teams", get(teams::list_teams))
        .route("/api/teams/{id}", get(teams::show_team))
        .route("/api/roles", get(roles::list_roles))
        .route("/api/roles/{id}", get(roles::show_role))
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            optional_auth,
        ));

    let authenticated_routes: Router<AppState> = Router::new()
        .route("/api/logout", post(auth::logout))
        .route("/api/user", get(auth::current_user))
        .route("/api/pages", post(pages::create_page))
        .route(
            "/api/pages/{page}",
            put(pages::update_page).delete(pages::delete_page),
        )
        .route("/api/media", post(media::create_media))
        .route(
            "/api/media/{id}",
            put(media::update_media).delete(media::delete_media),
        )
        .route("/api/teams", post(teams::create_team))
        .route(
            "/api/teams/{id}",
            put(teams::update_team).delete(teams::delete_team),
        )
        .route("/api/roles", post(roles::create_role))
        .route(
            "/api/roles/{id}",
            put(roles::update_role).delete(roles::delete_role),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(pool, require_auth));

    let mut app: Router<AppState> = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .merge(public_routes)
        .merge(authenticated_routes)
        .fallback(handlers::not_found);

    match config.storage_driver.as_str() {
        "local" => app = app.nest_service("/storage", ServeDir::new(&config.storage_root)),
        "memory" => app = app.route("/storage/{*key}", get(handlers::storage::serve_object)),
        _ => {}
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
    )
    .with_state(state)
}
