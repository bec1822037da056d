//! HTTP request handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use super::dto::*;
use super::error::ApiError;
use super::state::AppState;
use crate::scenario::{self, EventKind, Scenario, ScenarioTemplate};
use crate::service::ModelKind;

/// GET / - Service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Airbnb LA Forecasting API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "endpoints": {
            "forecast_volume": "/api/forecast/volume",
            "forecast_price": "/api/forecast/price",
            "forecast_occupancy": "/api/forecast/occupancy",
            "scenarios": "/api/scenarios",
            "simulate": "/api/scenarios/simulate",
        }
    }))
}

/// GET /api/health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        models_loaded: state.service.models_loaded(),
    })
}

/// POST /api/forecast/volume - Forecast listing volume
pub async fn forecast_volume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VolumeForecastRequest>,
) -> Result<Json<VolumeForecastResponse>, ApiError> {
    let forecast = state
        .service
        .forecast_volume(req.horizon, req.model, req.include_confidence)?;
    Ok(Json(forecast.into()))
}

/// POST /api/forecast/price - Forecast nightly prices for a property
pub async fn forecast_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceForecastRequest>,
) -> Result<Json<PriceForecastResponse>, ApiError> {
    let outlook = state.service.forecast_price(&req.profile, req.horizon)?;
    Ok(Json(outlook.into()))
}

/// POST /api/forecast/occupancy - Forecast occupancy and revenue
pub async fn forecast_occupancy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OccupancyForecastRequest>,
) -> Result<Json<OccupancyForecastResponse>, ApiError> {
    let outlook = state
        .service
        .forecast_occupancy(&req.profile, req.price, req.horizon)?;
    Ok(Json(outlook.into()))
}

/// GET /api/scenarios - Predefined scenario templates
pub async fn list_scenarios() -> Json<Vec<ScenarioTemplate>> {
    Json(scenario::predefined_scenarios())
}

/// GET /api/scenarios/events - Exogenous event catalog
pub async fn list_events() -> Json<Vec<EventInfo>> {
    let events = scenario::event_catalog()
        .into_iter()
        .map(|def| EventInfo {
            event_type: def.kind.to_string(),
            name: def.name,
            description: def.description,
            impact_multiplier: def.impact_multiplier,
            historical_periods: def.historical_periods,
            seasonal_pattern: def.seasonal_pattern,
        })
        .collect();
    Json(events)
}

/// POST /api/scenarios/simulate - Run one scenario against a base forecast
pub async fn simulate_scenario(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<ScenarioResponse>, ApiError> {
    let scenario = resolve_scenario(&req)?;
    let response = run_scenario(&state, &scenario, req.horizon, req.base_model)?;
    Ok(Json(response))
}

/// POST /api/scenarios/compare - Run several predefined scenarios
pub async fn compare_scenarios(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<Vec<ScenarioResponse>>, ApiError> {
    let mut responses = Vec::with_capacity(req.scenario_ids.len());
    for id in &req.scenario_ids {
        let template = scenario::find_scenario(id)
            .ok_or_else(|| ApiError::NotFound(format!("Scenario '{}' not found", id)))?;
        let scenario = Scenario::from(&template);
        responses.push(run_scenario(
            &state,
            &scenario,
            req.horizon,
            ModelKind::Ensemble,
        )?);
    }
    Ok(Json(responses))
}

/// Build the scenario to run: predefined id wins over a custom event list
fn resolve_scenario(req: &ScenarioRequest) -> Result<Scenario, ApiError> {
    if let Some(id) = &req.scenario_id {
        let template = scenario::find_scenario(id)
            .ok_or_else(|| ApiError::NotFound(format!("Scenario '{}' not found", id)))?;
        return Ok(Scenario::from(&template));
    }

    let mut events = Vec::with_capacity(req.events.len());
    for label in &req.events {
        let kind: EventKind = label
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Invalid event type: {}", label)))?;
        events.push(kind);
    }

    Ok(Scenario {
        name: req
            .scenario_name
            .clone()
            .unwrap_or_else(|| "Custom Scenario".to_string()),
        events,
        custom_shocks: req.custom_shocks.clone(),
    })
}

fn run_scenario(
    state: &AppState,
    scenario: &Scenario,
    horizon: usize,
    base_model: ModelKind,
) -> Result<ScenarioResponse, ApiError> {
    let base = state.service.forecast_volume(horizon, base_model, false)?;
    let outcome = scenario::simulate(&base.values, &base.quarters, scenario)?;
    let periods = base.quarters.iter().map(|q| q.to_string()).collect();
    Ok(ScenarioResponse::from_outcome(outcome, periods))
}
