//! REST API module using Axum
//!
//! Read endpoints for current overall status, recent checks and healing
//! records, and performance-over-window aggregates; write endpoints to
//! trigger an on-demand check for one component or all components.

pub mod envelope;
pub mod handlers;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `VIGIL_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for development dashboards.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("VIGIL_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// API routes under /api/v1.
fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/status", get(handlers::get_status))
        .route("/checks/recent", get(handlers::recent_checks))
        .route("/healing/recent", get(handlers::recent_healing))
        .route("/performance", get(handlers::performance))
        .route("/checks", post(handlers::run_all_checks))
        .route("/checks/:component", post(handlers::run_check))
        .with_state(state)
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Legacy liveness endpoint at /health
        .route("/health", get(handlers::legacy_health_check).with_state(state))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
