//! Recurrent-style sequence model: lag-window autoregression on a
//! min-max scaled series

use crate::data::QuarterlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils;

/// Sequence model that scales the series to [0, 1], fits a linear map from
/// a lookback window to the next value, and forecasts by rolling the
/// window forward.
#[derive(Debug, Clone)]
pub struct SequenceModel {
    name: String,
    /// Number of past quarters fed into each prediction
    lookback: usize,
}

/// Trained sequence model
#[derive(Debug, Clone)]
pub struct TrainedSequenceModel {
    name: String,
    lookback: usize,
    /// Bias followed by one weight per lag
    weights: Vec<f64>,
    /// Min-max scaling bounds from training
    scale_min: f64,
    scale_max: f64,
    /// Training series
    historical_data: Vec<f64>,
    residual_std: f64,
}

impl SequenceModel {
    /// Create a new sequence model with the given lookback window
    pub fn new(lookback: usize) -> Result<Self> {
        if lookback == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback must be positive".to_string(),
            ));
        }
        Ok(Self {
            name: format!("Sequence (lookback={})", lookback),
            lookback,
        })
    }
}

impl TrainedSequenceModel {
    fn scale(&self, value: f64) -> f64 {
        let range = self.scale_max - self.scale_min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.scale_min) / range
        }
    }

    fn unscale(&self, value: f64) -> f64 {
        value * (self.scale_max - self.scale_min) + self.scale_min
    }

    /// One step of the window map on scaled values, most recent last
    fn step(&self, window: &[f64]) -> f64 {
        let mut out = self.weights[0];
        for (i, &w) in window.iter().enumerate() {
            out += self.weights[1 + i] * w;
        }
        out
    }
}

impl ForecastModel for SequenceModel {
    type Trained = TrainedSequenceModel;

    fn train(&self, data: &QuarterlySeries) -> Result<TrainedSequenceModel> {
        let values = data.values();
        if values.len() < self.lookback + 2 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for lookback={}. Need at least {} observations, got {}.",
                self.lookback,
                self.lookback + 2,
                values.len()
            )));
        }

        let scale_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let scale_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let range = scale_max - scale_min;
        let scaled: Vec<f64> = if range == 0.0 {
            vec![0.0; values.len()]
        } else {
            values.iter().map(|v| (v - scale_min) / range).collect()
        };

        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..(scaled.len() - self.lookback) {
            let mut row = Vec::with_capacity(self.lookback + 1);
            row.push(1.0);
            row.extend_from_slice(&scaled[i..i + self.lookback]);
            rows.push(row);
            targets.push(scaled[i + self.lookback]);
        }

        let weights = if range == 0.0 {
            // Constant series, the window map is a plain bias
            vec![0.0; self.lookback + 1]
        } else {
            utils::solve_least_squares(&rows, &targets)?
        };

        let mut trained = TrainedSequenceModel {
            name: self.name.clone(),
            lookback: self.lookback,
            weights,
            scale_min,
            scale_max,
            historical_data: values.to_vec(),
            residual_std: 0.0,
        };

        let fitted = trained.predict(data)?;
        let residuals: Vec<f64> = fitted
            .values()
            .iter()
            .zip(values.iter())
            .map(|(f, a)| a - f)
            .collect();
        trained.residual_std = utils::residual_std_dev(&residuals);

        Ok(trained)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedSequenceModel {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        if self.historical_data.len() < self.lookback {
            return Err(ForecastError::ForecastingError(
                "Model has not been fitted to data".to_string(),
            ));
        }

        let mut window: Vec<f64> = self.historical_data
            [self.historical_data.len() - self.lookback..]
            .iter()
            .map(|&v| self.scale(v))
            .collect();

        let mut forecasts = Vec::with_capacity(horizons);
        for _ in 0..horizons {
            let next = self.step(&window);
            forecasts.push(self.unscale(next));
            window.remove(0);
            window.push(next);
        }

        ForecastResult::new(forecasts, horizons)
    }

    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult> {
        let values = data.values();
        if values.is_empty() {
            return Err(ForecastError::DataError("Empty quarterly series".to_string()));
        }

        let scaled: Vec<f64> = values.iter().map(|&v| self.scale(v)).collect();
        let mut predictions = Vec::with_capacity(values.len());

        for t in 0..values.len() {
            if t < self.lookback {
                predictions.push(values[t]);
            } else {
                let out = self.step(&scaled[t - self.lookback..t]);
                predictions.push(self.unscale(out));
            }
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
