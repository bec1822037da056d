//! JSON request/response shapes for the HTTP API

use crate::metrics::ForecastMetrics;
use crate::scenario::{CustomShock, ImpactSummary, ScenarioOutcome};
use crate::service::{
    ModelKind, OccupancyOutlook, PriceOutlook, PropertyProfile, Trend, VolumeForecast,
};
use serde::{Deserialize, Serialize};

fn default_volume_horizon() -> usize {
    4
}

fn default_price_horizon() -> usize {
    12
}

fn default_occupancy_horizon() -> usize {
    6
}

fn default_model() -> ModelKind {
    ModelKind::Ensemble
}

fn default_true() -> bool {
    true
}

/// Request for a listing volume forecast
#[derive(Debug, Deserialize)]
pub struct VolumeForecastRequest {
    #[serde(default = "default_volume_horizon")]
    pub horizon: usize,
    #[serde(default = "default_model")]
    pub model: ModelKind,
    #[serde(default = "default_true")]
    pub include_confidence: bool,
}

/// Single forecast data point
#[derive(Debug, Serialize)]
pub struct ForecastPoint {
    /// Time period (e.g. "2024Q1" or "2024-01")
    pub period: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_upper: Option<f64>,
}

/// Response for a listing volume forecast
#[derive(Debug, Serialize)]
pub struct VolumeForecastResponse {
    pub forecast: Vec<ForecastPoint>,
    pub model_used: ModelKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ForecastMetrics>,
}

impl From<VolumeForecast> for VolumeForecastResponse {
    fn from(forecast: VolumeForecast) -> Self {
        let points = forecast
            .quarters
            .iter()
            .enumerate()
            .map(|(i, quarter)| {
                let interval = forecast.intervals.as_ref().map(|iv| iv[i]);
                ForecastPoint {
                    period: quarter.to_string(),
                    value: forecast.values[i],
                    ci_lower: interval.map(|(lower, _)| lower),
                    ci_upper: interval.map(|(_, upper)| upper),
                }
            })
            .collect();
        Self {
            forecast: points,
            model_used: forecast.model_used,
            metrics: forecast.metrics,
        }
    }
}

/// Request for a property price forecast
#[derive(Debug, Deserialize)]
pub struct PriceForecastRequest {
    #[serde(flatten)]
    pub profile: PropertyProfile,
    #[serde(default = "default_price_horizon")]
    pub horizon: usize,
}

/// Response for a property price forecast
#[derive(Debug, Serialize)]
pub struct PriceForecastResponse {
    pub forecast: Vec<ForecastPoint>,
    pub current_avg: f64,
    pub recommended_price: f64,
    pub trend: Trend,
    pub seasonality_factor: f64,
}

impl From<PriceOutlook> for PriceForecastResponse {
    fn from(outlook: PriceOutlook) -> Self {
        let forecast = outlook
            .months
            .iter()
            .enumerate()
            .map(|(i, month)| ForecastPoint {
                period: month.clone(),
                value: outlook.values[i],
                ci_lower: Some(outlook.ci_lower[i]),
                ci_upper: Some(outlook.ci_upper[i]),
            })
            .collect();
        Self {
            forecast,
            current_avg: outlook.current_avg,
            recommended_price: outlook.recommended_price,
            trend: outlook.trend,
            seasonality_factor: outlook.seasonality_factor,
        }
    }
}

/// Request for an occupancy forecast
#[derive(Debug, Deserialize)]
pub struct OccupancyForecastRequest {
    #[serde(flatten)]
    pub profile: PropertyProfile,
    pub price: f64,
    #[serde(default = "default_occupancy_horizon")]
    pub horizon: usize,
}

/// Single occupancy forecast data point
#[derive(Debug, Serialize)]
pub struct OccupancyForecastPoint {
    /// Month in YYYY-MM format
    pub month: String,
    /// Predicted occupancy rate (0-1)
    pub occupancy_rate: f64,
}

/// Response for an occupancy forecast
#[derive(Debug, Serialize)]
pub struct OccupancyForecastResponse {
    pub forecast: Vec<OccupancyForecastPoint>,
    pub expected_bookings_per_month: f64,
    pub revenue_estimate: f64,
}

impl From<OccupancyOutlook> for OccupancyForecastResponse {
    fn from(outlook: OccupancyOutlook) -> Self {
        let forecast = outlook
            .months
            .into_iter()
            .map(|(month, occupancy_rate)| OccupancyForecastPoint {
                month,
                occupancy_rate,
            })
            .collect();
        Self {
            forecast,
            expected_bookings_per_month: outlook.expected_bookings_per_month,
            revenue_estimate: outlook.revenue_estimate,
        }
    }
}

/// Request for a scenario simulation
#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    /// Id of a predefined scenario; takes precedence over `events`
    #[serde(default)]
    pub scenario_id: Option<String>,
    /// Name for a custom scenario
    #[serde(default)]
    pub scenario_name: Option<String>,
    /// Event type labels for a custom scenario
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub custom_shocks: Vec<CustomShock>,
    #[serde(default = "default_volume_horizon")]
    pub horizon: usize,
    #[serde(default = "default_model")]
    pub base_model: ModelKind,
}

/// Response for a scenario simulation
#[derive(Debug, Serialize)]
pub struct ScenarioResponse {
    pub scenario_name: String,
    pub base_forecast: Vec<f64>,
    pub adjusted_forecast: Vec<f64>,
    pub total_impact_pct: Vec<f64>,
    pub summary: ImpactSummary,
    pub periods: Vec<String>,
}

impl ScenarioResponse {
    pub fn from_outcome(outcome: ScenarioOutcome, periods: Vec<String>) -> Self {
        Self {
            scenario_name: outcome.scenario_name,
            base_forecast: outcome.base_forecast,
            adjusted_forecast: outcome.adjusted_forecast,
            total_impact_pct: outcome.total_impact_pct,
            summary: outcome.summary,
            periods,
        }
    }
}

/// Request for side-by-side scenario comparison
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub scenario_ids: Vec<String>,
    #[serde(default = "default_volume_horizon")]
    pub horizon: usize,
}

/// Information about one exogenous event type
#[derive(Debug, Serialize)]
pub struct EventInfo {
    pub event_type: String,
    pub name: String,
    pub description: String,
    pub impact_multiplier: f64,
    pub historical_periods: Vec<crate::scenario::HistoricalPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_pattern: Option<[f64; 4]>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models_loaded: usize,
}
