//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Bearer token model for authentication
pub mod access_token;
/// Media library model
pub mod media;
/// Content page model
pub mod page;
/// Team role model
pub mod role;
/// Team member model
pub mod team;
/// User account model
pub mod user;
