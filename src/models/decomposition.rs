//! Additive decomposition forecaster: linear trend plus quarterly seasonality

use crate::data::QuarterlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils;

/// Additive decomposition model. Fits a least-squares linear trend, then
/// seasonal indices as the mean detrended value per quarter of year.
#[derive(Debug, Clone)]
pub struct Decomposition {
    name: String,
}

/// Trained additive decomposition model
#[derive(Debug, Clone)]
pub struct TrainedDecomposition {
    name: String,
    intercept: f64,
    slope: f64,
    /// Seasonal index per quarter of year (index 0 = Q1)
    seasonal: [f64; 4],
    /// Quarter of year of the first training observation (1-4)
    first_quarter_of_year: u8,
    /// Number of training observations
    train_len: usize,
    residual_std: f64,
}

impl Decomposition {
    pub fn new() -> Self {
        Self {
            name: "Additive Decomposition".to_string(),
        }
    }
}

impl Default for Decomposition {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainedDecomposition {
    fn trend(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }

    /// Quarter of year (1-4) at global time index t, continuing the
    /// training alignment
    fn quarter_of_year_at(&self, t: usize) -> usize {
        ((self.first_quarter_of_year as usize - 1 + t) % 4) + 1
    }
}

impl ForecastModel for Decomposition {
    type Trained = TrainedDecomposition;

    fn train(&self, data: &QuarterlySeries) -> Result<TrainedDecomposition> {
        let values = data.values();
        if values.len() < 3 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for decomposition. Need at least 3 observations, got {}.",
                values.len()
            )));
        }
        let first_quarter_of_year = data
            .quarters()
            .first()
            .map(|q| q.of_year())
            .ok_or_else(|| ForecastError::DataError("Empty quarterly series".to_string()))?;

        let (intercept, slope) = utils::fit_linear_trend(values)?;

        // Seasonal index: mean detrended value per quarter of year
        let mut sums = [0.0; 4];
        let mut counts = [0usize; 4];
        for (t, &value) in values.iter().enumerate() {
            let qoy = ((first_quarter_of_year as usize - 1 + t) % 4) as usize;
            sums[qoy] += value - (intercept + slope * t as f64);
            counts[qoy] += 1;
        }
        let mut seasonal = [0.0; 4];
        for i in 0..4 {
            if counts[i] > 0 {
                seasonal[i] = sums[i] / counts[i] as f64;
            }
        }

        let mut trained = TrainedDecomposition {
            name: self.name.clone(),
            intercept,
            slope,
            seasonal,
            first_quarter_of_year,
            train_len: values.len(),
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

impl TrainedForecastModel for TrainedDecomposition {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let values = (0..horizons)
            .map(|h| {
                let t = self.train_len + h;
                self.trend(t as f64) + self.seasonal[self.quarter_of_year_at(t) - 1]
            })
            .collect();
        ForecastResult::new(values, horizons)
    }

    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult> {
        if data.is_empty() {
            return Err(ForecastError::DataError("Empty quarterly series".to_string()));
        }
        let predictions: Vec<f64> = data
            .quarters()
            .iter()
            .enumerate()
            .map(|(t, quarter)| {
                self.trend(t as f64) + self.seasonal[quarter.of_year() as usize - 1]
            })
            .collect();
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
