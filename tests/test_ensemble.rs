use airbnb_forecast::data::{MarketHistory, Quarter, QuarterRecord, QuarterlySeries};
use airbnb_forecast::models::decomposition::Decomposition;
use airbnb_forecast::models::ensemble::Ensemble;
use airbnb_forecast::models::seasonal_arima::SeasonalArima;
use airbnb_forecast::models::sequence::SequenceModel;
use airbnb_forecast::models::var::{MarketVariable, Var};
use airbnb_forecast::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use approx::assert_relative_eq;

fn create_test_series() -> QuarterlySeries {
    let start = Quarter::new(2021, 1).unwrap();
    let values: Vec<f64> = (0..12).map(|t| 40000.0 + 500.0 * t as f64).collect();
    QuarterlySeries::from_start(start, values)
}

fn create_test_history() -> MarketHistory {
    // Each variable gets its own wobble so the series are not collinear
    let records = (0..12)
        .map(|t| QuarterRecord {
            quarter: Quarter::new(2021 + t / 4, (t % 4 + 1) as u8).unwrap(),
            total_listings: 40000.0 + 500.0 * t as f64 + 150.0 * ((t % 4) as f64 - 1.5),
            avg_price: 200.0 + 3.0 * t as f64 + ((t * 7) % 5) as f64,
            occupancy_rate: 0.5 + 0.01 * t as f64 + 0.02 * ((t % 3) as f64 - 1.0),
            reviews_per_listing: 8.0 + 0.1 * t as f64 + 0.05 * ((t % 2) as f64),
        })
        .collect();
    MarketHistory::new(records).unwrap()
}

fn two_member_ensemble(data: &QuarterlySeries) -> Ensemble {
    let mut ensemble = Ensemble::new();
    ensemble.add_member(
        "sarima",
        Box::new(SeasonalArima::quarterly().train(data).unwrap()),
        0.5,
    );
    ensemble.add_member(
        "decomposition",
        Box::new(Decomposition::new().train(data).unwrap()),
        0.5,
    );
    ensemble
}

/// A member that always fails, for the renormalization path
#[derive(Debug)]
struct FailingModel;

impl TrainedForecastModel for FailingModel {
    fn forecast(&self, _horizons: usize) -> airbnb_forecast::error::Result<ForecastResult> {
        Err(airbnb_forecast::ForecastError::ForecastingError(
            "always fails".to_string(),
        ))
    }

    fn predict(&self, _data: &QuarterlySeries) -> airbnb_forecast::error::Result<ForecastResult> {
        Err(airbnb_forecast::ForecastError::ForecastingError(
            "always fails".to_string(),
        ))
    }

    fn residual_std(&self) -> f64 {
        0.0
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_ensemble_is_weighted_sum_of_members() {
    let data = create_test_series();
    let sarima = SeasonalArima::quarterly().train(&data).unwrap();
    let decomposition = Decomposition::new().train(&data).unwrap();

    let sarima_values = sarima.forecast(4).unwrap().values().to_vec();
    let decomposition_values = decomposition.forecast(4).unwrap().values().to_vec();

    let mut ensemble = Ensemble::new();
    ensemble.add_member("sarima", Box::new(sarima), 0.7);
    ensemble.add_member("decomposition", Box::new(decomposition), 0.3);

    let combined = ensemble.forecast(4).unwrap();
    for i in 0..4 {
        let expected = 0.7 * sarima_values[i] + 0.3 * decomposition_values[i];
        assert_relative_eq!(combined.values()[i], expected, max_relative = 1e-9);
    }
}

#[test]
fn test_ensemble_empty_fails() {
    let ensemble = Ensemble::new();
    assert!(ensemble.forecast(4).is_err());
}

#[test]
fn test_set_weights_validation() {
    let data = create_test_series();
    let mut ensemble = two_member_ensemble(&data);

    // Must sum to 1
    assert!(ensemble.set_weights(&[("sarima", 0.5), ("decomposition", 0.2)]).is_err());
    // Unknown member name
    assert!(ensemble.set_weights(&[("sarima", 0.5), ("mystery", 0.5)]).is_err());

    ensemble
        .set_weights(&[("sarima", 0.8), ("decomposition", 0.2)])
        .unwrap();
    let weights = ensemble.weights();
    assert_eq!(weights, vec![("sarima", 0.8), ("decomposition", 0.2)]);
}

#[test]
fn test_auto_weight_by_mape() {
    let data = create_test_series();
    let mut ensemble = two_member_ensemble(&data);

    // Half the error should earn double the weight
    let weights = ensemble
        .auto_weight_by_mape(&[("sarima", 2.0), ("decomposition", 4.0)])
        .unwrap();

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    assert_relative_eq!(total, 1.0, max_relative = 1e-9);
    let sarima_weight = weights.iter().find(|(n, _)| n == "sarima").unwrap().1;
    let decomposition_weight = weights.iter().find(|(n, _)| n == "decomposition").unwrap().1;
    assert_relative_eq!(sarima_weight, 2.0 / 3.0, max_relative = 1e-9);
    assert_relative_eq!(decomposition_weight, 1.0 / 3.0, max_relative = 1e-9);

    assert!(ensemble.auto_weight_by_mape(&[]).is_err());
    assert!(ensemble.auto_weight_by_mape(&[("sarima", 0.0)]).is_err());
}

#[test]
fn test_failed_member_renormalizes() {
    let data = create_test_series();
    let decomposition = Decomposition::new().train(&data).unwrap();
    let solo_values = decomposition.forecast(4).unwrap().values().to_vec();

    let mut ensemble = Ensemble::new();
    ensemble.add_member("failing", Box::new(FailingModel), 0.5);
    ensemble.add_member("decomposition", Box::new(decomposition), 0.5);

    // The failing member is skipped and the survivor takes full weight
    let combined = ensemble.forecast(4).unwrap();
    for i in 0..4 {
        assert_relative_eq!(combined.values()[i], solo_values[i], max_relative = 1e-9);
    }
}

#[test]
fn test_all_members_failing_is_an_error() {
    let mut ensemble = Ensemble::new();
    ensemble.add_member("failing", Box::new(FailingModel), 1.0);
    assert!(ensemble.forecast(4).is_err());
}

#[test]
fn test_ensemble_intervals_are_weighted() {
    let data = create_test_series();
    let mut ensemble = Ensemble::new();
    ensemble.add_member(
        "sarima",
        Box::new(SeasonalArima::quarterly().train(&data).unwrap()),
        0.5,
    );
    ensemble.add_member(
        "sequence",
        Box::new(SequenceModel::new(3).unwrap().train(&data).unwrap()),
        0.5,
    );

    let forecast = ensemble.forecast_with_intervals(4, 0.95).unwrap();
    let intervals = forecast.intervals().unwrap();
    assert_eq!(intervals.len(), 4);
    for ((lower, upper), value) in intervals.iter().zip(forecast.values().iter()) {
        assert!(lower <= value && value <= upper);
    }
}

#[test]
fn test_var_needs_enough_quarters() {
    let short = MarketHistory::sample();
    assert!(Var::new(MarketVariable::Volume).train(&short).is_err());
}

#[test]
fn test_var_forecast_tracks_target_scale() {
    let history = create_test_history();
    let trained = Var::new(MarketVariable::Volume).train(&history).unwrap();

    let forecast = trained.forecast(4).unwrap();
    assert_eq!(forecast.horizons(), 4);
    for value in forecast.values() {
        assert!(*value > 35000.0 && *value < 55000.0);
    }

    // Predictions only line up with the training window
    let volume = history.volume();
    assert_eq!(trained.predict(&volume).unwrap().values().len(), volume.len());
    let short = volume.slice(0, Some(4)).unwrap();
    assert!(trained.predict(&short).is_err());
}

#[test]
fn test_var_price_target() {
    let history = create_test_history();
    let trained = Var::new(MarketVariable::AvgPrice).train(&history).unwrap();
    let forecast = trained.forecast(2).unwrap();
    for value in forecast.values() {
        assert!(*value > 150.0 && *value < 350.0);
    }
}
