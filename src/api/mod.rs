//! HTTP API surface: route mounting and resource handlers.
//!
//! # Data Flow
//! ```text
//! router.rs: readiness + /1.0/articles, wrapped in
//!     CORS → trace → request-id → timeout layers
//! articles.rs: CRUD handlers against the store pool
//! ```

pub mod articles;
pub mod router;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::health::HealthState;

pub use router::router;

/// State injected into request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub health: Arc<HealthState>,
}

impl FromRef<AppState> for Arc<HealthState> {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
