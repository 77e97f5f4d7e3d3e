//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use api::{
    ErrorResponse, HealthResponse, ResultsParams, TrackRequest, VariantListResponse,
};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/variants", get(api::list_variants))
        .route("/api/variants/:user_id", get(api::get_variant))
        .route("/api/events", post(api::track_event))
        .route("/api/results", get(api::get_results))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
