//! Prediction serving: trains the volume models and answers forecast
//! requests for volume, price and occupancy

use crate::data::{MarketHistory, Quarter, QuarterlySeries};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_forecast, ForecastMetrics};
use crate::models::decomposition::Decomposition;
use crate::models::ensemble::Ensemble;
use crate::models::gradient_boost::GradientBoost;
use crate::models::seasonal_arima::SeasonalArima;
use crate::models::sequence::SequenceModel;
use crate::models::var::{MarketVariable, Var};
use crate::models::{ForecastModel, TrainedForecastModel};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Volume forecasting models served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Sarima,
    Decomposition,
    Sequence,
    GradientBoost,
    Var,
    Ensemble,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Sarima,
        ModelKind::Decomposition,
        ModelKind::Sequence,
        ModelKind::GradientBoost,
        ModelKind::Var,
        ModelKind::Ensemble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Sarima => "sarima",
            ModelKind::Decomposition => "decomposition",
            ModelKind::Sequence => "sequence",
            ModelKind::GradientBoost => "gradient_boost",
            ModelKind::Var => "var",
            ModelKind::Ensemble => "ensemble",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| ForecastError::ValidationError(format!("Unknown model: {}", s)))
    }
}

/// Airbnb room types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "Entire home/apt")]
    EntireHome,
    #[serde(rename = "Private room")]
    PrivateRoom,
    #[serde(rename = "Hotel room")]
    HotelRoom,
    #[serde(rename = "Shared room")]
    SharedRoom,
}

/// Property features used by the price and occupancy forecasts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyProfile {
    pub room_type: RoomType,
    pub neighborhood: String,
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub accommodates: Option<u32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Direction of a price forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Volume forecast produced by the service
#[derive(Debug, Clone)]
pub struct VolumeForecast {
    pub quarters: Vec<Quarter>,
    pub values: Vec<f64>,
    pub intervals: Option<Vec<(f64, f64)>>,
    pub model_used: ModelKind,
    pub metrics: Option<ForecastMetrics>,
}

/// Monthly price outlook for a property
#[derive(Debug, Clone)]
pub struct PriceOutlook {
    /// Month labels in YYYY-MM format
    pub months: Vec<String>,
    pub values: Vec<f64>,
    pub ci_lower: Vec<f64>,
    pub ci_upper: Vec<f64>,
    pub current_avg: f64,
    pub recommended_price: f64,
    pub trend: Trend,
    pub seasonality_factor: f64,
}

/// Monthly occupancy outlook for a property
#[derive(Debug, Clone)]
pub struct OccupancyOutlook {
    /// (month label, occupancy rate) pairs
    pub months: Vec<(String, f64)>,
    pub expected_bookings_per_month: f64,
    pub revenue_estimate: f64,
}

/// Monthly price seasonality, January first
const PRICE_SEASONAL_FACTORS: [f64; 12] = [
    1.0, 0.95, 1.05, 1.1, 1.15, 1.2, 1.25, 1.2, 1.1, 1.05, 1.0, 0.95,
];

/// Monthly occupancy seasonality
const OCCUPANCY_SEASONAL_PATTERN: [f64; 6] = [0.95, 1.0, 1.05, 1.1, 1.15, 1.1];

/// Fallback quarterly growth rate for the simple projection
const FALLBACK_GROWTH_RATE: f64 = 0.03;

const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Serving layer: holds the market history and all trained volume models
pub struct ForecastService {
    history: MarketHistory,
    models: HashMap<ModelKind, Box<dyn TrainedForecastModel>>,
    metrics: HashMap<ModelKind, ForecastMetrics>,
}

impl fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastService")
            .field("quarters", &self.history.len())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ForecastService {
    /// Train every volume model on the market history. Models that fail to
    /// train (usually from too few quarters) are skipped with a warning.
    pub fn train(history: MarketHistory) -> Result<Self> {
        let volume = history.volume();
        let mut models: HashMap<ModelKind, Box<dyn TrainedForecastModel>> = HashMap::new();

        Self::train_into(&mut models, ModelKind::Sarima, &SeasonalArima::quarterly(), &volume);
        Self::train_into(&mut models, ModelKind::Decomposition, &Decomposition::new(), &volume);
        if let Ok(sequence) = SequenceModel::new(3) {
            Self::train_into(&mut models, ModelKind::Sequence, &sequence, &volume);
        }
        Self::train_into(&mut models, ModelKind::GradientBoost, &GradientBoost::quarterly(), &volume);

        match Var::new(MarketVariable::Volume).train(&history) {
            Ok(trained) => {
                models.insert(ModelKind::Var, Box::new(trained));
            }
            Err(err) => {
                tracing::warn!(model = "var", error = %err, "Model training skipped");
            }
        }

        let metrics = Self::holdout_metrics(&volume);
        let ensemble = Self::build_ensemble(&volume, &metrics);
        if let Some(ensemble) = ensemble {
            models.insert(ModelKind::Ensemble, Box::new(ensemble));
        }

        tracing::info!(
            quarters = history.len(),
            models = models.len(),
            "Forecast service trained"
        );

        Ok(Self {
            history,
            models,
            metrics,
        })
    }

    fn train_into<M: ForecastModel>(
        models: &mut HashMap<ModelKind, Box<dyn TrainedForecastModel>>,
        kind: ModelKind,
        model: &M,
        volume: &QuarterlySeries,
    ) where
        M::Trained: 'static,
    {
        match model.train(volume) {
            Ok(trained) => {
                models.insert(kind, Box::new(trained));
            }
            Err(err) => {
                tracing::warn!(model = %kind, error = %err, "Model training skipped");
            }
        }
    }

    /// Train-on-head, score-on-tail validation metrics per model. Needs at
    /// least 8 quarters to leave a meaningful test tail.
    fn holdout_metrics(volume: &QuarterlySeries) -> HashMap<ModelKind, ForecastMetrics> {
        let mut metrics = HashMap::new();
        if volume.len() < 8 {
            return metrics;
        }
        let (train, test) = match volume.train_test_split(0.25) {
            Ok(split) => split,
            Err(_) => return metrics,
        };

        let mut score = |kind: ModelKind, forecast: Result<crate::models::ForecastResult>| {
            if let Ok(result) = forecast {
                if let Ok(m) = evaluate_forecast(result.values(), test.values()) {
                    metrics.insert(kind, m);
                }
            }
        };

        let horizon = test.len();
        score(
            ModelKind::Sarima,
            SeasonalArima::quarterly()
                .train(&train)
                .and_then(|m| m.forecast(horizon)),
        );
        score(
            ModelKind::Decomposition,
            Decomposition::new()
                .train(&train)
                .and_then(|m| m.forecast(horizon)),
        );
        if let Ok(sequence) = SequenceModel::new(3) {
            score(
                ModelKind::Sequence,
                sequence.train(&train).and_then(|m| m.forecast(horizon)),
            );
        }
        score(
            ModelKind::GradientBoost,
            GradientBoost::quarterly()
                .train(&train)
                .and_then(|m| m.forecast(horizon)),
        );

        metrics
    }

    /// Ensemble over the sarima, decomposition and sequence members.
    /// Weighted by inverse validation MAPE when available, equal otherwise.
    fn build_ensemble(
        volume: &QuarterlySeries,
        metrics: &HashMap<ModelKind, ForecastMetrics>,
    ) -> Option<Ensemble> {
        let mut ensemble = Ensemble::new();
        let mut member_kinds = Vec::new();

        if let Ok(trained) = SeasonalArima::quarterly().train(volume) {
            ensemble.add_member(ModelKind::Sarima.as_str(), Box::new(trained), 0.0);
            member_kinds.push(ModelKind::Sarima);
        }
        if let Ok(trained) = Decomposition::new().train(volume) {
            ensemble.add_member(ModelKind::Decomposition.as_str(), Box::new(trained), 0.0);
            member_kinds.push(ModelKind::Decomposition);
        }
        if let Ok(sequence) = SequenceModel::new(3) {
            if let Ok(trained) = sequence.train(volume) {
                ensemble.add_member(ModelKind::Sequence.as_str(), Box::new(trained), 0.0);
                member_kinds.push(ModelKind::Sequence);
            }
        }

        if member_kinds.is_empty() {
            tracing::warn!("No ensemble members trained, ensemble unavailable");
            return None;
        }

        let mape_scores: Vec<(&str, f64)> = member_kinds
            .iter()
            .filter_map(|kind| metrics.get(kind).map(|m| (kind.as_str(), m.mape)))
            .filter(|(_, mape)| *mape > 0.0)
            .collect();

        if mape_scores.len() == member_kinds.len() {
            if let Ok(weights) = ensemble.auto_weight_by_mape(&mape_scores) {
                tracing::info!(?weights, "Ensemble auto-weighted by validation MAPE");
                return Some(ensemble);
            }
        }

        let equal = 1.0 / member_kinds.len() as f64;
        let equal_weights: Vec<(&str, f64)> = member_kinds
            .iter()
            .map(|kind| (kind.as_str(), equal))
            .collect();
        // Equal split always sums to 1 over the trained members
        if ensemble.set_weights(&equal_weights).is_err() {
            return None;
        }
        Some(ensemble)
    }

    /// The market history the service was trained on
    pub fn history(&self) -> &MarketHistory {
        &self.history
    }

    /// Number of successfully trained models
    pub fn models_loaded(&self) -> usize {
        self.models.len()
    }

    /// Validation metrics per model, where holdout evaluation was possible
    pub fn model_metrics(&self) -> &HashMap<ModelKind, ForecastMetrics> {
        &self.metrics
    }

    /// Forecast listing volume for the next `horizon` quarters
    pub fn forecast_volume(
        &self,
        horizon: usize,
        kind: ModelKind,
        include_intervals: bool,
    ) -> Result<VolumeForecast> {
        if !(1..=12).contains(&horizon) {
            return Err(ForecastError::ValidationError(format!(
                "Horizon must be 1-12 quarters, got {}",
                horizon
            )));
        }

        let quarters = self.history.last_quarter().following(horizon);

        let result = match self.models.get(&kind) {
            Some(model) => {
                let produced = if include_intervals {
                    model.forecast_with_intervals(horizon, DEFAULT_CONFIDENCE_LEVEL)
                } else {
                    model.forecast(horizon)
                };
                match produced {
                    Ok(result) => Some(result),
                    Err(err) => {
                        tracing::warn!(model = %kind, error = %err, "Forecast failed, falling back to simple projection");
                        None
                    }
                }
            }
            None => {
                tracing::warn!(model = %kind, "Model not loaded, falling back to simple projection");
                None
            }
        };

        let (values, intervals) = match result {
            Some(result) => {
                let intervals = result.intervals().map(|iv| iv.to_vec());
                (result.values().to_vec(), intervals)
            }
            None => {
                let (values, intervals) = self.simple_projection(horizon);
                (values, Some(intervals))
            }
        };

        let intervals = if include_intervals { intervals } else { None };

        Ok(VolumeForecast {
            quarters,
            values,
            intervals,
            model_used: kind,
            metrics: self.metrics.get(&kind).cloned(),
        })
    }

    /// Simple growth-based projection used when a model is unavailable:
    /// ~3% per quarter from the last observed volume, with ±5% bands
    fn simple_projection(&self, horizon: usize) -> (Vec<f64>, Vec<(f64, f64)>) {
        let current = self.history.volume().last_value().unwrap_or(0.0);
        let values: Vec<f64> = (1..=horizon)
            .map(|i| current * (1.0 + FALLBACK_GROWTH_RATE).powi(i as i32))
            .collect();
        let intervals = values.iter().map(|v| (v * 0.95, v * 1.05)).collect();
        (values, intervals)
    }

    /// Month labels starting right after the last observed quarter
    fn future_months(&self, horizon: usize) -> Result<Vec<String>> {
        let start_quarter = self.history.last_quarter().succ();
        let first = NaiveDate::from_ymd_opt(start_quarter.year(), start_quarter.first_month(), 1)
            .ok_or_else(|| ForecastError::DataError("Invalid forecast start date".to_string()))?;

        let mut months = Vec::with_capacity(horizon);
        let mut current = first;
        for _ in 0..horizon {
            months.push(format!("{:04}-{:02}", current.year(), current.month()));
            current = current
                .checked_add_months(Months::new(1))
                .ok_or_else(|| ForecastError::DataError("Forecast date overflow".to_string()))?;
        }
        Ok(months)
    }

    /// Average nightly price in the most recent quarter
    fn market_avg_price(&self) -> f64 {
        self.history
            .avg_price()
            .last_value()
            .filter(|p| *p > 0.0)
            .unwrap_or(150.0)
    }

    /// Forecast monthly nightly prices for a property
    pub fn forecast_price(&self, profile: &PropertyProfile, horizon: usize) -> Result<PriceOutlook> {
        if !(1..=24).contains(&horizon) {
            return Err(ForecastError::ValidationError(format!(
                "Horizon must be 1-24 months, got {}",
                horizon
            )));
        }

        let mut base_price = self.market_avg_price();
        base_price *= match profile.room_type {
            RoomType::EntireHome => 1.5,
            RoomType::PrivateRoom => 0.7,
            RoomType::HotelRoom | RoomType::SharedRoom => 1.0,
        };
        base_price += profile.bedrooms as f64 * 30.0;
        base_price += profile.amenities.len() as f64 * 5.0;

        let months = self.future_months(horizon)?;
        let values: Vec<f64> = months
            .iter()
            .map(|label| {
                let month_index = month_of(label);
                base_price * PRICE_SEASONAL_FACTORS[month_index]
            })
            .collect();

        let first = values[0];
        let last = values[values.len() - 1];
        let trend = if last > first * 1.02 {
            Trend::Increasing
        } else if last < first * 0.98 {
            Trend::Decreasing
        } else {
            Trend::Stable
        };

        let max_factor = PRICE_SEASONAL_FACTORS.iter().cloned().fold(f64::MIN, f64::max);
        let min_factor = PRICE_SEASONAL_FACTORS.iter().cloned().fold(f64::MAX, f64::min);

        Ok(PriceOutlook {
            ci_lower: values.iter().map(|v| v * 0.9).collect(),
            ci_upper: values.iter().map(|v| v * 1.1).collect(),
            months,
            values,
            current_avg: base_price,
            recommended_price: base_price * 1.05,
            trend,
            seasonality_factor: max_factor / min_factor,
        })
    }

    /// Forecast monthly occupancy and revenue for a property
    /// Property features beyond price do not move the estimate yet; the
    /// profile is accepted so the request shape matches the price endpoint.
    pub fn forecast_occupancy(
        &self,
        _profile: &PropertyProfile,
        price: f64,
        horizon: usize,
    ) -> Result<OccupancyOutlook> {
        if !(1..=12).contains(&horizon) {
            return Err(ForecastError::ValidationError(format!(
                "Horizon must be 1-12 months, got {}",
                horizon
            )));
        }
        if price <= 0.0 {
            return Err(ForecastError::ValidationError(
                "Price must be positive".to_string(),
            ));
        }
        let base_occupancy = self
            .history
            .occupancy()
            .last_value()
            .filter(|o| *o > 0.0)
            .unwrap_or(0.70);

        // Price sensitivity: -20% occupancy per 100% price premium over the
        // market average, clamped to a [0.3, 1.0] adjustment
        let price_ratio = price / self.market_avg_price();
        let adjustment = (1.0 - (price_ratio - 1.0) * 0.2).clamp(0.3, 1.0);
        let occupancy = base_occupancy * adjustment;

        let labels = self.future_months(horizon)?;
        let months: Vec<(String, f64)> = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let rate = occupancy * OCCUPANCY_SEASONAL_PATTERN[i % OCCUPANCY_SEASONAL_PATTERN.len()];
                (label, rate.min(1.0))
            })
            .collect();

        let avg_occupancy =
            months.iter().map(|(_, rate)| rate).sum::<f64>() / months.len() as f64;
        let days_per_month = 30.0;
        let expected_bookings_per_month = days_per_month * avg_occupancy;
        let revenue_estimate = expected_bookings_per_month * price;

        Ok(OccupancyOutlook {
            months,
            expected_bookings_per_month,
            revenue_estimate,
        })
    }
}

/// Zero-based month index from a YYYY-MM label
fn month_of(label: &str) -> usize {
    label
        .rsplit('-')
        .next()
        .and_then(|m| m.parse::<usize>().ok())
        .map(|m| (m - 1) % 12)
        .unwrap_or(0)
}
