pub mod auth_service;
pub mod files;
pub mod media_service;
pub mod page_service;
pub mod relations;
pub mod role_service;
pub mod team_service;
