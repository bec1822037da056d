use airbnb_forecast::api::dto::{
    CompareRequest, OccupancyForecastRequest, PriceForecastRequest, ScenarioRequest,
    VolumeForecastRequest,
};
use airbnb_forecast::api::error::ApiError;
use airbnb_forecast::api::handlers;
use airbnb_forecast::api::state::AppState;
use airbnb_forecast::data::{MarketHistory, Quarter, QuarterRecord};
use airbnb_forecast::service::ForecastService;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

fn test_state() -> Arc<AppState> {
    let records = (0..12)
        .map(|t| QuarterRecord {
            quarter: Quarter::new(2021 + t / 4, (t % 4 + 1) as u8).unwrap(),
            total_listings: 40000.0 + 500.0 * t as f64 + 150.0 * ((t % 4) as f64 - 1.5),
            avg_price: 200.0 + 3.0 * t as f64 + ((t * 7) % 5) as f64,
            occupancy_rate: 0.5 + 0.01 * t as f64 + 0.02 * ((t % 3) as f64 - 1.0),
            reviews_per_listing: 8.0 + 0.1 * t as f64 + 0.05 * ((t % 2) as f64),
        })
        .collect();
    let history = MarketHistory::new(records).unwrap();
    let service = ForecastService::train(history).unwrap();
    Arc::new(AppState { service })
}

fn volume_request(json: serde_json::Value) -> VolumeForecastRequest {
    serde_json::from_value(json).unwrap()
}

#[tokio::test]
async fn test_health() {
    let Json(body) = handlers::health(State(test_state())).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.models_loaded, 6);
}

#[tokio::test]
async fn test_forecast_volume_defaults() {
    // An empty body falls back to horizon 4, ensemble, with intervals
    let req = volume_request(serde_json::json!({}));
    let Json(body) = handlers::forecast_volume(State(test_state()), Json(req))
        .await
        .unwrap();

    assert_eq!(body.forecast.len(), 4);
    assert_eq!(body.forecast[0].period, "2024Q1");
    assert!(body.forecast.iter().all(|p| p.ci_lower.is_some()));
}

#[tokio::test]
async fn test_forecast_volume_named_model() {
    let req = volume_request(serde_json::json!({
        "horizon": 2,
        "model": "sarima",
        "include_confidence": false
    }));
    let Json(body) = handlers::forecast_volume(State(test_state()), Json(req))
        .await
        .unwrap();

    assert_eq!(body.forecast.len(), 2);
    assert!(body.forecast.iter().all(|p| p.ci_lower.is_none()));
}

#[tokio::test]
async fn test_forecast_volume_horizon_rejected() {
    let req = volume_request(serde_json::json!({ "horizon": 99 }));
    let err = handlers::forecast_volume(State(test_state()), Json(req))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_forecast_price() {
    let req: PriceForecastRequest = serde_json::from_value(serde_json::json!({
        "room_type": "Entire home/apt",
        "neighborhood": "Venice",
        "bedrooms": 2,
        "amenities": ["Wifi"],
        "horizon": 6
    }))
    .unwrap();

    let Json(body) = handlers::forecast_price(State(test_state()), Json(req))
        .await
        .unwrap();
    assert_eq!(body.forecast.len(), 6);
    assert!(body.recommended_price > 0.0);
}

#[tokio::test]
async fn test_forecast_occupancy() {
    let req: OccupancyForecastRequest = serde_json::from_value(serde_json::json!({
        "room_type": "Private room",
        "neighborhood": "Silver Lake",
        "bedrooms": 1,
        "price": 120.0
    }))
    .unwrap();

    let Json(body) = handlers::forecast_occupancy(State(test_state()), Json(req))
        .await
        .unwrap();
    // Default horizon is six months
    assert_eq!(body.forecast.len(), 6);
    assert!(body.revenue_estimate > 0.0);
}

#[tokio::test]
async fn test_list_scenarios_and_events() {
    let Json(scenarios) = handlers::list_scenarios().await;
    assert!(scenarios.iter().any(|s| s.id == "olympics_2028"));

    let Json(events) = handlers::list_events().await;
    assert_eq!(events.len(), 6);
    assert!(events.iter().any(|e| e.event_type == "covid_19"));
}

#[tokio::test]
async fn test_simulate_predefined_scenario() {
    let req: ScenarioRequest = serde_json::from_value(serde_json::json!({
        "scenario_id": "baseline",
        "horizon": 4
    }))
    .unwrap();

    let Json(body) = handlers::simulate_scenario(State(test_state()), Json(req))
        .await
        .unwrap();
    assert_eq!(body.base_forecast, body.adjusted_forecast);
    assert_eq!(body.periods.len(), 4);
    assert_eq!(body.periods[0], "2024Q1");
}

#[tokio::test]
async fn test_simulate_unknown_scenario_is_404() {
    let req: ScenarioRequest = serde_json::from_value(serde_json::json!({
        "scenario_id": "asteroid"
    }))
    .unwrap();

    let err = handlers::simulate_scenario(State(test_state()), Json(req))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_simulate_custom_events() {
    let req: ScenarioRequest = serde_json::from_value(serde_json::json!({
        "scenario_name": "Recession watch",
        "events": ["economic_recession", "extreme_weather"],
        "horizon": 4
    }))
    .unwrap();

    let Json(body) = handlers::simulate_scenario(State(test_state()), Json(req))
        .await
        .unwrap();
    assert_eq!(body.scenario_name, "Recession watch");
    // Extreme weather is seasonal, so at least some quarter moves
    assert!(body.total_impact_pct.iter().any(|i| *i != 0.0));
}

#[tokio::test]
async fn test_simulate_invalid_event_is_400() {
    let req: ScenarioRequest = serde_json::from_value(serde_json::json!({
        "events": ["earthquake"]
    }))
    .unwrap();

    let err = handlers::simulate_scenario(State(test_state()), Json(req))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_simulate_invalid_shock_is_400() {
    let req: ScenarioRequest = serde_json::from_value(serde_json::json!({
        "custom_shocks": [{ "period": "2024Q2", "impact": -1.5 }]
    }))
    .unwrap();

    let err = handlers::simulate_scenario(State(test_state()), Json(req))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_compare_scenarios() {
    let req: CompareRequest = serde_json::from_value(serde_json::json!({
        "scenario_ids": ["baseline", "pessimistic"],
        "horizon": 4
    }))
    .unwrap();

    let Json(body) = handlers::compare_scenarios(State(test_state()), Json(req))
        .await
        .unwrap();
    assert_eq!(body.len(), 2);

    let baseline = &body[0];
    let pessimistic = &body[1];
    assert_eq!(baseline.base_forecast, pessimistic.base_forecast);
    // The pessimistic bundle includes seasonal extreme weather, which
    // always bites somewhere in the window
    assert!(pessimistic.summary.avg_impact_pct < baseline.summary.avg_impact_pct);
}

#[tokio::test]
async fn test_compare_unknown_id_is_404() {
    let req: CompareRequest = serde_json::from_value(serde_json::json!({
        "scenario_ids": ["baseline", "asteroid"]
    }))
    .unwrap();

    let err = handlers::compare_scenarios(State(test_state()), Json(req))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::NotFound(_)));
}
