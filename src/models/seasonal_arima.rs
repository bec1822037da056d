//! Seasonal ARIMA model for quarterly series

use crate::data::QuarterlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils;

/// Seasonal ARIMA model: AR(p) with d-order differencing and a seasonal
/// AR term at lag `s` (s = 4 for quarterly data). Coefficients are fitted
/// by least squares on the differenced series.
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// Seasonal period (s)
    s: usize,
}

/// Trained seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedSeasonalArima {
    name: String,
    p: usize,
    d: usize,
    s: usize,
    /// Whether the seasonal lag term was included in the fit
    seasonal_term: bool,
    /// Intercept followed by AR coefficients (and the seasonal one last)
    coefficients: Vec<f64>,
    /// Training series
    historical_data: Vec<f64>,
    /// One-step residual standard deviation on the original scale
    residual_std: f64,
}

impl SeasonalArima {
    /// Create a new seasonal ARIMA model
    pub fn new(p: usize, d: usize, s: usize) -> Result<Self> {
        if p == 0 {
            return Err(ForecastError::InvalidParameter(
                "AR order p must be positive".to_string(),
            ));
        }
        if d > 2 {
            return Err(ForecastError::InvalidParameter(
                "Differencing order d must be at most 2".to_string(),
            ));
        }
        if s < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period s must be at least 2".to_string(),
            ));
        }
        Ok(Self {
            name: format!("SARIMA({},{})x({})", p, d, s),
            p,
            d,
            s,
        })
    }

    /// Quarterly default: SARIMA(1,1)x(4)
    pub fn quarterly() -> Self {
        Self {
            name: "SARIMA(1,1)x(4)".to_string(),
            p: 1,
            d: 1,
            s: 4,
        }
    }
}

/// Apply d-order differencing
fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut current = values.to_vec();
    for _ in 0..d {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Binomial coefficient for small arguments
fn binomial(n: usize, k: usize) -> f64 {
    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64 / (i + 1) as f64;
    }
    result
}

/// One-step un-differencing: recover x_t from the differenced value and
/// the d previous original values (most recent first).
fn integrate_step(diffed: f64, previous: &[f64], d: usize) -> f64 {
    let mut value = diffed;
    for k in 1..=d {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        value += sign * binomial(d, k) * previous[k - 1];
    }
    value
}

impl TrainedSeasonalArima {
    /// Predicted differenced value from lagged differenced history
    fn predict_diffed(&self, history: &[f64], t: usize) -> f64 {
        let mut prediction = self.coefficients[0];
        for i in 0..self.p {
            prediction += self.coefficients[1 + i] * history[t - 1 - i];
        }
        if self.seasonal_term {
            prediction += self.coefficients[1 + self.p] * history[t - self.s];
        }
        prediction
    }

    fn min_lag(&self) -> usize {
        if self.seasonal_term {
            self.p.max(self.s)
        } else {
            self.p
        }
    }
}

impl ForecastModel for SeasonalArima {
    type Trained = TrainedSeasonalArima;

    fn train(&self, data: &QuarterlySeries) -> Result<TrainedSeasonalArima> {
        let values = data.values();
        let min_needed = self.p + self.d + 2;
        if values.len() < min_needed {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for {}. Need at least {} observations, got {}.",
                self.name,
                min_needed,
                values.len()
            )));
        }

        let diffed = difference(values, self.d);

        // Only keep the seasonal lag when the differenced series is long
        // enough to estimate it
        let seasonal_term = diffed.len() > self.s + self.p + 1;
        let min_lag = if seasonal_term {
            self.p.max(self.s)
        } else {
            self.p
        };

        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for t in min_lag..diffed.len() {
            let mut row = Vec::with_capacity(2 + self.p);
            row.push(1.0);
            for i in 0..self.p {
                row.push(diffed[t - 1 - i]);
            }
            if seasonal_term {
                row.push(diffed[t - self.s]);
            }
            rows.push(row);
            targets.push(diffed[t]);
        }

        let coefficients = utils::solve_least_squares(&rows, &targets)?;

        let mut trained = TrainedSeasonalArima {
            name: self.name.clone(),
            p: self.p,
            d: self.d,
            s: self.s,
            seasonal_term,
            coefficients,
            historical_data: values.to_vec(),
            residual_std: 0.0,
        };

        // Residuals from one-step-ahead predictions on the training series
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

impl TrainedForecastModel for TrainedSeasonalArima {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        if self.historical_data.is_empty() {
            return Err(ForecastError::ForecastingError(
                "Model has not been fitted to data".to_string(),
            ));
        }

        let mut diffed = difference(&self.historical_data, self.d);
        let mut originals = self.historical_data.to_vec();
        let mut forecasts = Vec::with_capacity(horizons);

        for _ in 0..horizons {
            let t = diffed.len();
            let next_diffed = if t >= self.min_lag() {
                self.predict_diffed(&diffed, t)
            } else {
                *diffed.last().unwrap_or(&0.0)
            };

            let previous: Vec<f64> = originals.iter().rev().take(self.d.max(1)).copied().collect();
            let next = integrate_step(next_diffed, &previous, self.d);

            diffed.push(next_diffed);
            originals.push(next);
            forecasts.push(next);
        }

        ForecastResult::new(forecasts, horizons)
    }

    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult> {
        let values = data.values();
        if values.is_empty() {
            return Err(ForecastError::DataError("Empty quarterly series".to_string()));
        }

        let diffed = difference(values, self.d);
        let min_lag = self.min_lag();
        let mut predictions = Vec::with_capacity(values.len());

        for t in 0..values.len() {
            let diff_index = t as i64 - self.d as i64;
            if diff_index < min_lag as i64 {
                // Not enough lagged history, fall back to the observation
                predictions.push(values[t]);
                continue;
            }
            let diff_index = diff_index as usize;
            let predicted_diff = self.predict_diffed(&diffed, diff_index);
            let previous: Vec<f64> = (1..=self.d.max(1)).map(|k| values[t - k]).collect();
            predictions.push(integrate_step(predicted_diff, &previous, self.d));
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
