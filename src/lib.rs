//! # Airbnb Forecast
//!
//! A forecasting backend for the Los Angeles short-term rental market.
//!
//! ## Features
//!
//! - Quarterly market history handling (listing volume, prices, occupancy)
//! - Forecasting models (seasonal ARIMA, trend/seasonal decomposition,
//!   lag-window sequence model, gradient boosting, vector autoregression)
//! - Inverse-error weighted ensemble with confidence intervals
//! - Scenario simulation with exogenous events and custom shocks
//! - HTTP JSON API for volume, price and occupancy forecasts
//!
//! ## Quick Start
//!
//! ```rust
//! use airbnb_forecast::data::MarketHistory;
//! use airbnb_forecast::service::{ForecastService, ModelKind};
//!
//! # fn main() -> airbnb_forecast::error::Result<()> {
//! // Train every model on the built-in sample history
//! let service = ForecastService::train(MarketHistory::sample())?;
//!
//! // Four quarters ahead, with confidence intervals
//! let forecast = service.forecast_volume(4, ModelKind::Ensemble, true)?;
//! assert_eq!(forecast.values.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scenario;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{MarketHistory, Quarter, QuarterlySeries};
pub use crate::error::ForecastError;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::service::ForecastService;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
