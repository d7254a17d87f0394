//! Authorization policies.
//!
//! Every resource uses the same rule: anyone may read, only admins may
//! create, update or delete. What differs per resource is the denial message.

use crate::{error::AppError, middleware::auth::AuthContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Page,
    Media,
    Team,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
}

/// Whether `user` may perform `action` on `resource`.
pub fn allows(user: &AuthContext, _resource: Resource, action: Action) -> bool {
    match action {
        Action::ViewAny | Action::View => true,
        Action::Create | Action::Update | Action::Delete => user.is_admin(),
    }
}

/// `Ok(())` when allowed, otherwise `403` with the resource's message.
pub fn authorize(user: &AuthContext, resource: Resource, action: Action) -> Result<(), AppError> {
    if allows(user, resource, action) {
        return Ok(());
    }
    tracing::info!(
        user_id = user.user_id,
        ?resource,
        ?action,
        "Denied non-admin write"
    );
    Err(AppError::Forbidden(denial_message(resource, action).to_string()))
}

fn denial_message(resource: Resource, action: Action) -> &'static str {
    match (resource, action) {
        (Resource::Page, Action::Create) => "You are not authorized to create pages",
        (Resource::Page, Action::Update) => "You are not authorized to update this page",
        (Resource::Page, Action::Delete) => "You are not authorized to delete this page",
        (Resource::Media, Action::Create) => "You are not authorized to upload media",
        (Resource::Media, Action::Update) => "You are not authorized to update this media",
        (Resource::Media, Action::Delete) => "You are not authorized to delete this media",
        (Resource::Team, Action::Create) => "You are not authorized to create team members",
        (Resource::Team, Action::Update) => "You are not authorized to update this team member",
        (Resource::Team, Action::Delete) => "You are not authorized to delete this team member",
        (Resource::Role, Action::Create) => "You are not authorized to create roles",
        (Resource::Role, Action::Update) => "You are not authorized to update this role",
        (Resource::Role, Action::Delete) => "You are not authorized to delete this role",
        (_, Action::ViewAny | Action::View) => "You are not authorized to view this resource",
    }
}
