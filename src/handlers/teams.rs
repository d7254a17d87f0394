//! Team member HTTP handlers.
//!
//! - GET /api/teams - List team members with their user and role
//! - GET /api/teams/{id} - Get a team member
//! - POST /api/teams - Create a team member (admin, multipart)
//! - PUT /api/teams/{id} - Update a team member (admin, multipart, partial)
//! - DELETE /api/teams/{id} - Soft-delete a team member (admin)

use axum::{
    Extension,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};

use crate::{
    db::DbPool,
    error::{AppError, ValidationErrors},
    handlers::{form_body, parse_id},
    middleware::auth::AuthContext,
    models::team::{NewTeam, TeamChanges, TeamResponse},
    policy::{self, Action, Resource},
    response::ApiResponse,
    services::team_service,
    storage::SharedStorage,
    upload::{MultipartForm, PROFILE_PICTURE},
    validation::{MAX_TEXT_CHARS, check_display_name, check_updated_name, is_display_name},
};

const TEAM_NOT_FOUND: &str = "Team member not found";

pub async fn list_teams(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
) -> Result<ApiResponse<Vec<TeamResponse>>, AppError> {
    let members = team_service::list(&pool, &storage).await?;

    Ok(ApiResponse::ok(members, "Team members retrieved successfully"))
}

pub async fn show_team(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<TeamResponse>, AppError> {
    let team_id = parse_id(&team_id, TEAM_NOT_FOUND)?;
    let member = team_service::find(&pool, team_id)
        .await?
        .ok_or_else(|| AppError::not_found(TEAM_NOT_FOUND))?;

    let member = team_service::respond(&pool, &storage, member).await?;
    Ok(ApiResponse::ok(member, "Team member retrieved successfully"))
}

/// Create a team member.
///
/// # Endpoint
///
/// `POST /api/teams` (`multipart/form-data`)
///
/// # Form Fields
///
/// - `name` (required): display name, at most 255 characters
/// - `role_id` (required): id of an existing role
/// - `bio` (required): at most 1000 characters
/// - `profile_picture` (required): jpg, jpeg or png image, at most 2 MB
/// - `user_id` (required): id of a user who has no team member entry yet
///
/// # Response
///
/// - **Success (201 Created)**: The member with embedded `user` and `role`
/// - **Error (403)**: Caller is not an admin
/// - **Error (422)**: Validation failed
pub async fn create_team(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<TeamResponse>, AppError> {
    policy::authorize(&auth, Resource::Team, Action::Create)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();

    let name = form.text("name").map(|v| v.trim().to_string());
    check_display_name(&mut errors, "name", "name", name.as_deref());

    let role_id = match filled(&form, "role_id") {
        None => {
            errors.add("role_id", "The role id field is required.");
            None
        }
        Some(raw) => match raw.trim().parse::<i64>() {
            Err(_) => {
                errors.add("role_id", "The role id field must be an integer.");
                None
            }
            Ok(id) if !team_service::role_exists(&pool, id).await? => {
                errors.add("role_id", "The selected role id is invalid.");
                None
            }
            Ok(id) => Some(id),
        },
    };

    let bio = filled(&form, "bio").map(str::to_string);
    match bio.as_deref() {
        None => errors.add("bio", "The bio field is required."),
        Some(bio) if bio.chars().count() > MAX_TEXT_CHARS => errors.add(
            "bio",
            format!("The bio field must not be greater than {MAX_TEXT_CHARS} characters."),
        ),
        Some(_) => {}
    }

    let user_id = match filled(&form, "user_id") {
        None => {
            errors.add("user_id", "The user id field is required.");
            None
        }
        Some(raw) if !is_display_name(raw) => {
            errors.add("user_id", "The user_id contains invalid characters.");
            None
        }
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(id) if team_service::user_exists(&pool, id).await? => {
                if team_service::user_has_team(&pool, id).await? {
                    errors.add("user_id", "This user already has a team member entry.");
                    None
                } else {
                    Some(id)
                }
            }
            _ => {
                errors.add("user_id", "The selected user id is invalid.");
                None
            }
        },
    };

    let picture = form.take_file("profile_picture");
    let detected = match &picture {
        Some(file) => PROFILE_PICTURE.check("profile_picture", file, &mut errors),
        None => {
            errors.add("profile_picture", "The profile picture field is required.");
            None
        }
    };

    errors.into_result()?;

    let (Some(name), Some(role_id), Some(bio), Some(user_id), Some(picture), Some(detected)) =
        (name, role_id, bio, user_id, picture, detected)
    else {
        return Err(AppError::Internal("validated team member lost a field".into()));
    };

    let new_team = NewTeam {
        name,
        role_id,
        bio,
        user_id,
    };
    let member = team_service::create(&pool, &storage, new_team, picture, detected).await?;

    Ok(ApiResponse::created(member, "Team member created successfully"))
}

/// Update a team member.
///
/// # Endpoint
///
/// `PUT /api/teams/{id}` (`multipart/form-data`)
///
/// Any of `name`, `role_id`, `bio` and `profile_picture` may be sent; a text
/// field that is sent must not be empty. The previous picture stays in storage.
pub async fn update_team(
    State(pool): State<DbPool>,
    State(storage): State<SharedStorage>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<String>,
    body: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<TeamResponse>, AppError> {
    let team_id = parse_id(&team_id, TEAM_NOT_FOUND)?;
    let member = team_service::find(&pool, team_id)
        .await?
        .ok_or_else(|| AppError::not_found(TEAM_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Team, Action::Update)?;

    let mut form = form_body(body).await?;
    let mut errors = ValidationErrors::new();
    let mut changes = TeamChanges::default();

    if form.has_text("name") {
        let value = form.text("name").unwrap_or_default().trim();
        check_updated_name(&mut errors, "name", value);
        if !errors.has("name") {
            changes.name = Some(value.to_string());
        }
    }

    if form.has_text("role_id") {
        match form.text("role_id").map(str::trim).filter(|v| !v.is_empty()) {
            None => errors.add("role_id", "The role is required"),
            Some(raw) => match raw.parse::<i64>() {
                Err(_) => errors.add("role_id", "The role must be a valid ID"),
                Ok(id) if !team_service::role_exists(&pool, id).await? => {
                    errors.add("role_id", "The selected role does not exist")
                }
                Ok(id) => changes.role_id = Some(id),
            },
        }
    }

    if form.has_text("bio") {
        match form.text("bio").filter(|v| !v.is_empty()) {
            None => errors.add("bio", "The bio field is required"),
            Some(bio) if bio.chars().count() > MAX_TEXT_CHARS => errors.add(
                "bio",
                format!("The bio must not exceed {MAX_TEXT_CHARS} characters"),
            ),
            Some(bio) => changes.bio = Some(bio.to_string()),
        }
    }

    let picture = match form.take_file("profile_picture") {
        Some(file) => PROFILE_PICTURE
            .check("profile_picture", &file, &mut errors)
            .map(|detected| (file, detected)),
        None => None,
    };

    errors.into_result()?;

    if changes.is_empty() && picture.is_none() {
        return Err(AppError::unprocessable("No valid data provided for update"));
    }

    let member = team_service::update(&pool, &storage, member, changes, picture).await?;

    Ok(ApiResponse::ok(member, "Team member updated successfully"))
}

/// Soft-delete a team member. The profile picture is kept.
pub async fn delete_team(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let team_id = parse_id(&team_id, TEAM_NOT_FOUND)?;
    let member = team_service::find(&pool, team_id)
        .await?
        .ok_or_else(|| AppError::not_found(TEAM_NOT_FOUND))?;

    policy::authorize(&auth, Resource::Team, Action::Delete)?;

    team_service::delete(&pool, member).await?;

    Ok(ApiResponse::message("Team member deleted successfully"))
}

/// A non-empty text field.
fn filled<'a>(form: &'a MultipartForm, name: &str) -> Option<&'a str> {
    form.text(name).filter(|v| !v.trim().is_empty())
}
