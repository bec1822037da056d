//! HTTP API: routing, handlers, DTOs and error rendering

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use state::AppState;

/// Build the application router with CORS and request tracing
pub fn router(state: Arc<AppState>, settings: &Settings) -> Router {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/forecast/volume", post(handlers::forecast_volume))
        .route("/api/forecast/price", post(handlers::forecast_price))
        .route(
            "/api/forecast/occupancy",
            post(handlers::forecast_occupancy),
        )
        .route("/api/scenarios", get(handlers::list_scenarios))
        .route("/api/scenarios/events", get(handlers::list_events))
        .route("/api/scenarios/simulate", post(handlers::simulate_scenario))
        .route("/api/scenarios/compare", post(handlers::compare_scenarios))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
