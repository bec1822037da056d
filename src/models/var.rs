//! Vector autoregression over the multivariate quarterly market table

use crate::data::{MarketHistory, QuarterlySeries};
use crate::error::{ForecastError, Result};
use crate::models::{ForecastResult, TrainedForecastModel};
use crate::utils;

/// Market variable tracked by the VAR model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketVariable {
    Volume,
    AvgPrice,
    Occupancy,
    ReviewsPerListing,
}

impl MarketVariable {
    pub const ALL: [MarketVariable; 4] = [
        MarketVariable::Volume,
        MarketVariable::AvgPrice,
        MarketVariable::Occupancy,
        MarketVariable::ReviewsPerListing,
    ];

    fn series(&self, history: &MarketHistory) -> QuarterlySeries {
        match self {
            MarketVariable::Volume => history.volume(),
            MarketVariable::AvgPrice => history.avg_price(),
            MarketVariable::Occupancy => history.occupancy(),
            MarketVariable::ReviewsPerListing => history.reviews_per_listing(),
        }
    }

    fn index(&self) -> usize {
        MarketVariable::ALL.iter().position(|v| v == self).unwrap_or(0)
    }
}

/// VAR(1) model: each variable regressed on the previous full state
/// vector. Variables are standardized before fitting because their scales
/// differ by orders of magnitude.
#[derive(Debug, Clone)]
pub struct Var {
    name: String,
    /// Which component the forecast exposes
    target: MarketVariable,
}

/// Trained VAR(1) model
#[derive(Debug, Clone)]
pub struct TrainedVar {
    name: String,
    target_index: usize,
    /// Per-equation coefficients: intercept then one weight per variable
    equations: Vec<Vec<f64>>,
    /// Standardization parameters per variable
    means: Vec<f64>,
    stds: Vec<f64>,
    /// Standardized training observations, one state vector per quarter
    states: Vec<Vec<f64>>,
    /// Raw target series from training
    target_history: Vec<f64>,
    residual_std: f64,
}

impl Var {
    /// Create a VAR(1) model exposing the given target variable
    pub fn new(target: MarketVariable) -> Self {
        Self {
            name: format!("VAR(1) [{:?}]", target),
            target,
        }
    }

    /// Train on the full multivariate history
    pub fn train(&self, history: &MarketHistory) -> Result<TrainedVar> {
        let k = MarketVariable::ALL.len();
        let n = history.len();
        // One row per transition, k + 1 coefficients per equation
        if n < k + 3 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for VAR(1) over {} variables. Need at least {} quarters, got {}.",
                k,
                k + 3,
                n
            )));
        }

        let raw: Vec<Vec<f64>> = MarketVariable::ALL
            .iter()
            .map(|v| v.series(history).values().to_vec())
            .collect();

        let mut means = Vec::with_capacity(k);
        let mut stds = Vec::with_capacity(k);
        for series in &raw {
            let mean = series.iter().sum::<f64>() / n as f64;
            let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            means.push(mean);
            stds.push(if var.sqrt() > 0.0 { var.sqrt() } else { 1.0 });
        }

        // Standardized state vectors by quarter
        let states: Vec<Vec<f64>> = (0..n)
            .map(|t| {
                (0..k)
                    .map(|i| (raw[i][t] - means[i]) / stds[i])
                    .collect()
            })
            .collect();

        let rows: Vec<Vec<f64>> = states[..n - 1]
            .iter()
            .map(|state| {
                let mut row = Vec::with_capacity(k + 1);
                row.push(1.0);
                row.extend_from_slice(state);
                row
            })
            .collect();

        let mut equations = Vec::with_capacity(k);
        for i in 0..k {
            let targets: Vec<f64> = states[1..].iter().map(|s| s[i]).collect();
            equations.push(utils::solve_least_squares(&rows, &targets)?);
        }

        let target_index = self.target.index();
        let target_history = raw[target_index].clone();

        let mut trained = TrainedVar {
            name: self.name.clone(),
            target_index,
            equations,
            means,
            stds,
            states,
            target_history: target_history.clone(),
            residual_std: 0.0,
        };

        // One-step residuals of the target equation on the original scale
        let mut residuals = Vec::with_capacity(n - 1);
        for t in 1..n {
            let predicted = trained.step(&trained.states[t - 1])[target_index];
            let predicted_raw = predicted * trained.stds[target_index] + trained.means[target_index];
            residuals.push(target_history[t] - predicted_raw);
        }
        trained.residual_std = utils::residual_std_dev(&residuals);

        Ok(trained)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedVar {
    /// Advance the standardized state vector one quarter
    fn step(&self, state: &[f64]) -> Vec<f64> {
        self.equations
            .iter()
            .map(|coef| {
                let mut out = coef[0];
                for (i, &s) in state.iter().enumerate() {
                    out += coef[1 + i] * s;
                }
                out
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedVar {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut state = self
            .states
            .last()
            .cloned()
            .ok_or_else(|| {
                ForecastError::ForecastingError("Model has not been fitted to data".to_string())
            })?;

        let mut forecasts = Vec::with_capacity(horizons);
        for _ in 0..horizons {
            state = self.step(&state);
            let raw =
                state[self.target_index] * self.stds[self.target_index] + self.means[self.target_index];
            forecasts.push(raw);
        }

        ForecastResult::new(forecasts, horizons)
    }

    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult> {
        // VAR predictions need the full state history, so the series must
        // line up with the training window
        if data.len() != self.states.len() {
            return Err(ForecastError::ValidationError(format!(
                "VAR predict expects the training window ({} quarters), got {}",
                self.states.len(),
                data.len()
            )));
        }

        let mut predictions = Vec::with_capacity(data.len());
        predictions.push(self.target_history[0]);
        for t in 1..data.len() {
            let predicted = self.step(&self.states[t - 1])[self.target_index];
            predictions.push(predicted * self.stds[self.target_index] + self.means[self.target_index]);
        }

        let horizons = predictions.len();
        ForecastResult::new(predictions, horizons)
    }

    fn residual_std(&self) -> f64 {
        self.residual_std
    }

    fn name(&self) -> &str {
        &self.name
    }
}
