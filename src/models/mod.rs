//! Forecasting models for quarterly market series

use crate::data::{Quarter, QuarterlySeries};
use crate::error::{ForecastError, Result};
use crate::utils;
use std::fmt::Debug;

pub mod decomposition;
pub mod ensemble;
pub mod gradient_boost;
pub mod seasonal_arima;
pub mod sequence;
pub mod var;

/// Forecast result containing predicted values
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Confidence intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Forecast quarters (optional)
    quarters: Option<Vec<Quarter>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }
        Ok(Self {
            values,
            horizons,
            intervals: None,
            quarters: None,
        })
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }
        Ok(Self {
            values,
            horizons,
            intervals: Some(intervals),
            quarters: None,
        })
    }

    /// Attach forecast quarter labels
    pub fn with_quarters(mut self, quarters: Vec<Quarter>) -> Result<Self> {
        if quarters.len() != self.horizons {
            return Err(ForecastError::ValidationError(format!(
                "Quarters length ({}) doesn't match horizons ({})",
                quarters.len(),
                self.horizons
            )));
        }
        self.quarters = Some(quarters);
        Ok(self)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Get the forecast quarters, if available
    pub fn quarters(&self) -> Option<&[Quarter]> {
        self.quarters.as_deref()
    }

    /// Generate confidence intervals from a residual standard deviation.
    /// Interval width grows with the square root of the forecast step.
    pub fn confidence_intervals(
        &self,
        residual_std: f64,
        confidence_level: f64,
    ) -> Result<Vec<(f64, f64)>> {
        let z = utils::z_score(confidence_level)?;
        let intervals = self
            .values
            .iter()
            .enumerate()
            .map(|(step, v)| {
                let margin = z * residual_std * ((step + 1) as f64).sqrt();
                (v - margin, v + margin)
            })
            .collect();
        Ok(intervals)
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        if self.values.len() != actual.len() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }
        let sum: f64 = self
            .values
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).abs())
            .sum();
        Ok(sum / self.values.len() as f64)
    }

    /// Calculate mean squared error between forecast and actual values
    pub fn mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        if self.values.len() != actual.len() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }
        let sum: f64 = self
            .values
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).powi(2))
            .sum();
        Ok(sum / self.values.len() as f64)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Generate forecast with confidence intervals at the given level
    fn forecast_with_intervals(
        &self,
        horizons: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult> {
        let result = self.forecast(horizons)?;
        let intervals = result.confidence_intervals(self.residual_std(), confidence_level)?;
        ForecastResult::new_with_intervals(result.values.clone(), horizons, intervals)
    }

    /// In-sample one-step-ahead predictions over the given series
    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult>;

    /// In-sample residual standard deviation, used for interval width
    fn residual_std(&self) -> f64;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a quarterly series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the series
    fn train(&self, data: &QuarterlySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
