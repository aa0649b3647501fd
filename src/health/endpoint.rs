//! Readiness check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use crate::health::state::HealthState;

/// `GET /readiness`: 200 while the process accepts traffic, 503 while draining.
pub async fn readiness(State(health): State<Arc<HealthState>>) -> StatusCode {
    if health.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
