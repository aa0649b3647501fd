//! Route mounting and middleware stack.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{articles, AppState};
use crate::config::AppConfig;
use crate::health;
use crate::http::RequestIdLayer;

/// Build the full application router: readiness, the article resource,
/// and the middleware stack (request id runs before trace so spans carry it).
pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/readiness", get(health::readiness))
        .nest("/1.0/articles", articles::routes())
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.http.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer)
        .layer(cors_layer(config))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_credentials(true);

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    if !origins.is_empty() {
        cors = cors.allow_origin(origins);
    }

    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    if !headers.is_empty() {
        cors = cors.allow_headers(headers);
    }

    let exposed: Vec<HeaderName> = config
        .cors
        .exposed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    if !exposed.is_empty() {
        cors = cors.expose_headers(exposed);
    }

    cors
}
