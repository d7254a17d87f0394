//! Shared application state handed to every handler.

use axum::extract::FromRef;

use crate::{db::DbPool, storage::SharedStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub storage: SharedStorage,
}

impl AppState {
    pub fn new(pool: DbPool, storage: SharedStorage) -> Self {
        Self { pool, storage }
    }
}

/// Lets middleware and handlers keep extracting `State<DbPool>` directly.
impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for SharedStorage {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}
