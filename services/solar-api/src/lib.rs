//! Solar layer overlay and panel layout service.
//!
//! Fetches a location's raster layers from the Solar API, renders them as
//! map overlays, and lays out panel grids over drawn or building outlines.

pub mod config;
pub mod error;
pub mod handlers;
pub mod layers;
pub mod solar_client;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// All routes with the shared middleware stack.
pub fn build_router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/overlay", get(handlers::overlay_handler))
        .route("/api/panels", post(handlers::panels_handler))
        .route(
            "/api/capacity",
            get(handlers::capacity_area_handler).post(handlers::capacity_polygon_handler),
        )
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
