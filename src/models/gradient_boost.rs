//! Gradient-boosted regression stumps on lag features

use crate::data::QuarterlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils;

/// Gradient boosting over depth-1 stumps. Each round fits one stump to the
/// current residuals with a shrinkage factor; features are the `lookback`
/// most recent values.
#[derive(Debug, Clone)]
pub struct GradientBoost {
    name: String,
    rounds: usize,
    learning_rate: f64,
    lookback: usize,
}

/// A single regression stump: split one lag feature at a threshold
#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl Stump {
    fn predict(&self, row: &[f64]) -> f64 {
        if row[self.feature] <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Trained gradient-boosted stump model
#[derive(Debug, Clone)]
pub struct TrainedGradientBoost {
    name: String,
    lookback: usize,
    learning_rate: f64,
    /// Initial prediction (training target mean)
    base: f64,
    stumps: Vec<Stump>,
    historical_data: Vec<f64>,
    residual_std: f64,
}

impl GradientBoost {
    /// Create a new model with the given boosting rounds, learning rate
    /// and lag window
    pub fn new(rounds: usize, learning_rate: f64, lookback: usize) -> Result<Self> {
        if rounds == 0 {
            return Err(ForecastError::InvalidParameter(
                "Boosting rounds must be positive".to_string(),
            ));
        }
        if learning_rate <= 0.0 || learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Learning rate must be in (0, 1]".to_string(),
            ));
        }
        if lookback == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback must be positive".to_string(),
            ));
        }
        Ok(Self {
            name: format!("Gradient Boost (rounds={}, lookback={})", rounds, lookback),
            rounds,
            learning_rate,
            lookback,
        })
    }

    /// Quarterly default: 50 rounds, 0.1 shrinkage, 2 lags
    pub fn quarterly() -> Self {
        Self {
            name: "Gradient Boost (rounds=50, lookback=2)".to_string(),
            rounds: 50,
            learning_rate: 0.1,
            lookback: 2,
        }
    }

    /// Fit the best stump for the current residuals
    fn fit_stump(rows: &[Vec<f64>], residuals: &[f64]) -> Option<Stump> {
        let k = rows[0].len();
        let mut best: Option<(f64, Stump)> = None;

        for feature in 0..k {
            let mut candidates: Vec<f64> = rows.iter().map(|r| r[feature]).collect();
            candidates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            candidates.dedup();

            for pair in candidates.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;

                let (mut left_sum, mut left_n) = (0.0, 0usize);
                let (mut right_sum, mut right_n) = (0.0, 0usize);
                for (row, &r) in rows.iter().zip(residuals.iter()) {
                    if row[feature] <= threshold {
                        left_sum += r;
                        left_n += 1;
                    } else {
                        right_sum += r;
                        right_n += 1;
                    }
                }
                if left_n == 0 || right_n == 0 {
                    continue;
                }
                let left_value = left_sum / left_n as f64;
                let right_value = right_sum / right_n as f64;

                let sse: f64 = rows
                    .iter()
                    .zip(residuals.iter())
                    .map(|(row, &r)| {
                        let pred = if row[feature] <= threshold {
                            left_value
                        } else {
                            right_value
                        };
                        (r - pred).powi(2)
                    })
                    .sum();

                let stump = Stump {
                    feature,
                    threshold,
                    left_value,
                    right_value,
                };
                match &best {
                    Some((best_sse, _)) if sse >= *best_sse => {}
                    _ => best = Some((sse, stump)),
                }
            }
        }

        best.map(|(_, stump)| stump)
    }
}

impl TrainedGradientBoost {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut out = self.base;
        for stump in &self.stumps {
            out += self.learning_rate * stump.predict(row);
        }
        out
    }
}

impl ForecastModel for GradientBoost {
    type Trained = TrainedGradientBoost;

    fn train(&self, data: &QuarterlySeries) -> Result<TrainedGradientBoost> {
        let values = data.values();
        if values.len() < self.lookback + 2 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for lookback={}. Need at least {} observations, got {}.",
                self.lookback,
                self.lookback + 2,
                values.len()
            )));
        }

        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..(values.len() - self.lookback) {
            rows.push(values[i..i + self.lookback].to_vec());
            targets.push(values[i + self.lookback]);
        }

        let base = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![base; targets.len()];
        let mut stumps = Vec::new();

        for _ in 0..self.rounds {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(predictions.iter())
                .map(|(t, p)| t - p)
                .collect();

            let stump = match Self::fit_stump(&rows, &residuals) {
                Some(s) => s,
                // No split improves the fit (e.g. constant features)
                None => break,
            };
            for (pred, row) in predictions.iter_mut().zip(rows.iter()) {
                *pred += self.learning_rate * stump.predict(row);
            }
            stumps.push(stump);
        }

        let mut trained = TrainedGradientBoost {
            name: self.name.clone(),
            lookback: self.lookback,
            learning_rate: self.learning_rate,
            base,
            stumps,
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

impl TrainedForecastModel for TrainedGradientBoost {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        if self.historical_data.len() < self.lookback {
            return Err(ForecastError::ForecastingError(
                "Model has not been fitted to data".to_string(),
            ));
        }

        let mut window: Vec<f64> =
            self.historical_data[self.historical_data.len() - self.lookback..].to_vec();
        let mut forecasts = Vec::with_capacity(horizons);

        for _ in 0..horizons {
            let next = self.predict_row(&window);
            forecasts.push(next);
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

        let mut predictions = Vec::with_capacity(values.len());
        for t in 0..values.len() {
            if t < self.lookback {
                predictions.push(values[t]);
            } else {
                predictions.push(self.predict_row(&values[t - self.lookback..t]));
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
