//! Weighted ensemble of trained forecast models

use crate::data::QuarterlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastResult, TrainedForecastModel};

/// Ensemble combining member model outputs with a weighted average.
/// Weights must sum to 1; members that fail to produce a forecast are
/// skipped and the remaining weights renormalize.
#[derive(Debug)]
pub struct Ensemble {
    name: String,
    members: Vec<(String, Box<dyn TrainedForecastModel>)>,
    weights: Vec<f64>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self {
            name: "Ensemble".to_string(),
            members: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Add a member model with an initial weight
    pub fn add_member(&mut self, name: impl Into<String>, model: Box<dyn TrainedForecastModel>, weight: f64) {
        self.members.push((name.into(), model));
        self.weights.push(weight);
    }

    /// Member names in order
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Current weight table
    pub fn weights(&self) -> Vec<(&str, f64)> {
        self.members
            .iter()
            .zip(self.weights.iter())
            .map(|((n, _), &w)| (n.as_str(), w))
            .collect()
    }

    /// Set member weights by name. Weights must sum to 1.
    pub fn set_weights(&mut self, weights: &[(&str, f64)]) -> Result<()> {
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ForecastError::ValidationError(format!(
                "Weights must sum to 1.0, got {}",
                total
            )));
        }

        for (name, _) in weights {
            if !self.members.iter().any(|(n, _)| n == name) {
                return Err(ForecastError::ValidationError(format!(
                    "Model '{}' not found in ensemble",
                    name
                )));
            }
        }

        for (i, (member_name, _)) in self.members.iter().enumerate() {
            if let Some((_, w)) = weights.iter().find(|(n, _)| n == member_name) {
                self.weights[i] = *w;
            } else {
                self.weights[i] = 0.0;
            }
        }
        Ok(())
    }

    /// Set weights from per-member validation MAPE: lower error gets a
    /// higher weight (inverse weighting, normalized to 1). Returns the
    /// resulting weight table.
    pub fn auto_weight_by_mape(&mut self, mape: &[(&str, f64)]) -> Result<Vec<(String, f64)>> {
        if mape.is_empty() {
            return Err(ForecastError::ValidationError(
                "At least one MAPE score is required for auto-weighting".to_string(),
            ));
        }
        for (_, score) in mape {
            if *score <= 0.0 {
                return Err(ForecastError::ValidationError(
                    "MAPE scores must be positive for inverse weighting".to_string(),
                ));
            }
        }

        let total_inverse: f64 = mape.iter().map(|(_, score)| 1.0 / score).sum();
        let weights: Vec<(&str, f64)> = mape
            .iter()
            .map(|(name, score)| (*name, (1.0 / score) / total_inverse))
            .collect();

        self.set_weights(&weights)?;
        Ok(weights.into_iter().map(|(n, w)| (n.to_string(), w)).collect())
    }

    /// Weighted combination over member forecasts, renormalizing when some
    /// members fail
    fn combine<F>(&self, horizons: usize, produce: F) -> Result<Vec<(f64, ForecastResult)>>
    where
        F: Fn(&dyn TrainedForecastModel) -> Result<ForecastResult>,
    {
        if self.members.is_empty() {
            return Err(ForecastError::ForecastingError(
                "Ensemble has no member models".to_string(),
            ));
        }

        let mut outputs = Vec::new();
        for ((name, model), &weight) in self.members.iter().zip(self.weights.iter()) {
            if weight == 0.0 {
                continue;
            }
            match produce(model.as_ref()) {
                Ok(result) if result.values().len() == horizons => {
                    outputs.push((weight, result));
                }
                Ok(_) => {
                    tracing::warn!(member = %name, "Ensemble member returned wrong horizon, skipping");
                }
                Err(err) => {
                    tracing::warn!(member = %name, error = %err, "Ensemble member forecast failed, skipping");
                }
            }
        }

        if outputs.is_empty() {
            return Err(ForecastError::ForecastingError(
                "No ensemble member produced a forecast".to_string(),
            ));
        }

        // Renormalize to compensate for skipped members
        let total: f64 = outputs.iter().map(|(w, _)| w).sum();
        for (w, _) in outputs.iter_mut() {
            *w /= total;
        }
        Ok(outputs)
    }
}

impl Default for Ensemble {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainedForecastModel for Ensemble {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let outputs = self.combine(horizons, |model| model.forecast(horizons))?;

        let mut values = vec![0.0; horizons];
        for (weight, result) in &outputs {
            for (acc, v) in values.iter_mut().zip(result.values().iter()) {
                *acc += weight * v;
            }
        }
        ForecastResult::new(values, horizons)
    }

    fn forecast_with_intervals(
        &self,
        horizons: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult> {
        let outputs = self.combine(horizons, |model| {
            model.forecast_with_intervals(horizons, confidence_level)
        })?;

        let mut values = vec![0.0; horizons];
        let mut lowers = vec![0.0; horizons];
        let mut uppers = vec![0.0; horizons];
        for (weight, result) in &outputs {
            let intervals = result.intervals().ok_or_else(|| {
                ForecastError::ForecastingError(
                    "Ensemble member returned no intervals".to_string(),
                )
            })?;
            for i in 0..horizons {
                values[i] += weight * result.values()[i];
                lowers[i] += weight * intervals[i].0;
                uppers[i] += weight * intervals[i].1;
            }
        }

        let intervals = lowers.into_iter().zip(uppers).collect();
        ForecastResult::new_with_intervals(values, horizons, intervals)
    }

    fn predict(&self, data: &QuarterlySeries) -> Result<ForecastResult> {
        let horizons = data.len();
        let outputs = self.combine(horizons, |model| model.predict(data))?;

        let mut values = vec![0.0; horizons];
        for (weight, result) in &outputs {
            for (acc, v) in values.iter_mut().zip(result.values().iter()) {
                *acc += weight * v;
            }
        }
        ForecastResult::new(values, horizons)
    }

    fn residual_std(&self) -> f64 {
        self.members
            .iter()
            .zip(self.weights.iter())
            .map(|((_, model), &w)| w * model.residual_std())
            .sum()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
