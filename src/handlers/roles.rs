//! Role HTTP handlers.
//!
//! - GET /api/roles - List roles
//! - GET /api/roles/{id} - Get a role
//! - POST /api/roles - Create a role (admin)
//! - PUT /api/roles/{id} - Update a role (admin)
//! - DELETE /api/roles/{id} - Soft-delete an unused role (admin)

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    db::DbPool,
    error::{AppError, ValidationErrors},
    handlers::{json_body, parse_id},
    middleware::auth::AuthContext,
    models::role::{CreateRoleRequest, Role, UpdateRoleRequest},
    policy::{self, Action, Resource},
    response::ApiResponse,
    services::role_service,
    validation::{MAX_NAME_CHARS, MAX_TEXT_CHARS, check_display_name, is_display_name},
};

const ROLE_NOT_FOUND: &str = "Role not found";

pub async fn list_roles(State(pool): State<DbPool>) -> Result<ApiResponse<Vec<Role>>, AppError> {
    let roles = role_service::list(&pool).await?;

    Ok(ApiResponse::ok(roles, "Roles retrieved successfully"))
}

pub async fn show_role(
    State(pool): State<DbPool>,
    Path(role_id): Path<String>,
) -> Result<ApiResponse<Role>, AppError> {
    let role_id = parse_id(&role_id, ROLE_NOT_FOUND)?;
    let role = role_service::find(&pool, role_id)
        .await?
        .ok_or_else(|| AppError::not_found(ROLE_NOT_FOUND))?;

    Ok(ApiResponse::ok(role, "Role retrieved successfully"))
}

/// Create a role.
///
/// # Endpoint
///
/// `POST /api/roles`
///
/// # Request Body
///
/// ```json
/// { "name": "QA Engineer", "description": "Quality assurance" }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The role
/// - **Error (403)**: Caller is not an admin
/// - **Error (422)**: Missing, malformed or duplicate name
pub async fn create_role(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<ApiResponse<Role>, AppError> {
    policy::authorize(&auth, Resource::Role, Action::Create)?;

    let request = json_body(body)?;
    let mut errors = ValidationErrors::new();

    let name = request.name.as_deref().map(str::trim);
    check_display_name(&mut errors, "name", "role name", name);
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        if role_service::name_taken(&pool, name, None).await? {
            errors.add("name", "The name has already been taken.");
        }
    }
    check_description(&mut errors, request.description.as_deref());

    errors.into_result()?;

    let Some(name) = name else {
        return Err(AppError::Internal("validated role lost its name".into()));
    };

    let role = role_service::create(&pool, name, request.description.as_deref()).await?;

    Ok(ApiResponse::created(role, "Role created successfully"))
}

/// Update a role.
///
/// # Endpoint
///
/// `PUT /api/roles/{id}`
///
/// Absent fields are left unchanged; `"description": null` clears the description.
pub async fn update_role(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<String>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<ApiResponse<Role>, AppError> {
    let role_id = parse_id(&role_id, ROLE_NOT_FOUND)?;
    let role = role_service::find(&pool, role_id)
        .await?
        .ok_or_else(|| AppError::not_found(ROLE_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Role, Action::Update)?;

    let request = json_body(body)?;
    let mut errors = ValidationErrors::new();

    let name = request.name.as_deref().map(str::trim);
    if let Some(name) = name {
        if name.is_empty() {
            errors.add("name", "The name field is required.");
        } else {
            if name.chars().count() > MAX_NAME_CHARS {
                errors.add(
                    "name",
                    format!("The name field must not be greater than {MAX_NAME_CHARS} characters."),
                );
            }
            if !is_display_name(name) {
                errors.add("name", "The role name contains invalid characters.");
            }
            if role_service::name_taken(&pool, name, Some(role.id)).await? {
                errors.add("name", "The name has already been taken.");
            }
        }
    }
    if let Some(description) = &request.description {
        check_description(&mut errors, description.as_deref());
    }

    errors.into_result()?;

    let role =
        role_service::update(&pool, role.id, name.map(str::to_string), request.description)
            .await?;

    Ok(ApiResponse::ok(role, "Role updated successfully"))
}

/// Soft-delete a role.
///
/// # Response
///
/// - **Success (200 OK)**: Role deleted
/// - **Error (422)**: A team member still references the role
pub async fn delete_role(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let role_id = parse_id(&role_id, ROLE_NOT_FOUND)?;
    let role = role_service::find(&pool, role_id)
        .await?
        .ok_or_else(|| AppError::not_found(ROLE_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Role, Action::Delete)?;

    if role_service::in_use(&pool, role.id).await? {
        return Err(AppError::unprocessable(
            "Cannot delete role as it is being used by team members",
        ));
    }

    role_service::delete(&pool, role.id).await?;

    Ok(ApiResponse::message("Role deleted successfully"))
}

fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    if description.is_some_and(|d| d.chars().count() > MAX_TEXT_CHARS) {
        errors.add(
            "description",
            format!("The description field must not be greater than {MAX_TEXT_CHARS} characters."),
        );
    }
}
