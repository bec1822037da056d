use airbnb_forecast::data::Quarter;
use airbnb_forecast::scenario::{
    self, CustomShock, EventKind, Scenario, event_catalog, find_scenario, predefined_scenarios,
};
use approx::assert_relative_eq;

fn quarters_from(year: i32, quarter: u8, horizon: usize) -> Vec<Quarter> {
    let mut out = vec![Quarter::new(year, quarter).unwrap()];
    while out.len() < horizon {
        out.push(out.last().unwrap().succ());
    }
    out
}

#[test]
fn test_event_kind_labels_round_trip() {
    for kind in EventKind::ALL {
        let parsed: EventKind = kind.as_str().parse().unwrap();
        assert_eq!(parsed, kind);
    }
    assert!("earthquake".parse::<EventKind>().is_err());
}

#[test]
fn test_event_catalog_covers_all_kinds() {
    let catalog = event_catalog();
    assert_eq!(catalog.len(), EventKind::ALL.len());
    for kind in EventKind::ALL {
        assert!(catalog.iter().any(|def| def.kind == kind));
    }
}

#[test]
fn test_empty_scenario_is_identity() {
    let base = vec![1000.0, 1100.0, 1200.0, 1300.0];
    let quarters = quarters_from(2024, 1, 4);
    let scenario = Scenario {
        name: "Baseline".to_string(),
        events: Vec::new(),
        custom_shocks: Vec::new(),
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    assert_eq!(outcome.adjusted_forecast, base);
    assert!(outcome.total_impact_pct.iter().all(|i| *i == 0.0));
    assert_relative_eq!(outcome.summary.avg_impact_pct, 0.0);
}

#[test]
fn test_covid_historical_period_impacts() {
    let base = vec![1000.0; 4];
    // 2020Q1-2021Q2 is the acute period with severity 0.8
    let quarters = quarters_from(2020, 1, 4);
    let scenario = Scenario {
        name: "Pandemic replay".to_string(),
        events: vec![EventKind::Covid19],
        custom_shocks: Vec::new(),
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    // -0.6 * 0.8 = -48% each quarter
    for (adjusted, impact) in outcome
        .adjusted_forecast
        .iter()
        .zip(outcome.total_impact_pct.iter())
    {
        assert_relative_eq!(*impact, -48.0, max_relative = 1e-9);
        assert_relative_eq!(*adjusted, 520.0, max_relative = 1e-9);
    }
    assert_relative_eq!(outcome.summary.max_negative_impact_pct, -48.0, max_relative = 1e-9);
}

#[test]
fn test_seasonal_event_varies_by_quarter() {
    let base = vec![1000.0; 4];
    let quarters = quarters_from(2024, 1, 4);
    let scenario = Scenario {
        name: "Rough weather".to_string(),
        events: vec![EventKind::ExtremeWeather],
        custom_shocks: Vec::new(),
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    // Pattern [0.3, 0.2, 0.5, 0.2] at -0.15 peak impact
    let expected = [-4.5, -3.0, -7.5, -3.0];
    for (impact, want) in outcome.total_impact_pct.iter().zip(expected.iter()) {
        assert_relative_eq!(*impact, *want, max_relative = 1e-9);
    }
}

#[test]
fn test_custom_shock_applies_to_matching_quarter_only() {
    let base = vec![1000.0; 4];
    let quarters = quarters_from(2024, 1, 4);
    let scenario = Scenario {
        name: "One bad summer".to_string(),
        events: Vec::new(),
        custom_shocks: vec![
            CustomShock {
                period: Quarter::new(2024, 3).unwrap(),
                impact: -0.35,
            },
            // Outside the forecast window, must be ignored
            CustomShock {
                period: Quarter::new(2030, 1).unwrap(),
                impact: 1.5,
            },
        ],
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    assert_eq!(outcome.adjusted_forecast, vec![1000.0, 1000.0, 650.0, 1000.0]);
}

#[test]
fn test_shock_impact_bounds() {
    let valid = CustomShock {
        period: Quarter::new(2024, 1).unwrap(),
        impact: 2.0,
    };
    assert!(valid.validate().is_ok());

    let too_low = CustomShock {
        period: Quarter::new(2024, 1).unwrap(),
        impact: -1.5,
    };
    assert!(too_low.validate().is_err());

    let base = vec![1000.0];
    let quarters = quarters_from(2024, 1, 1);
    let scenario = Scenario {
        name: "Bad shock".to_string(),
        events: Vec::new(),
        custom_shocks: vec![too_low],
    };
    assert!(scenario::simulate(&base, &quarters, &scenario).is_err());
}

#[test]
fn test_stacked_impacts_clamp_at_zero() {
    let base = vec![1000.0];
    // 2020Q1: covid (-0.48), recession (-0.28), and a -0.5 shock push the
    // combined impact below -100%
    let quarters = quarters_from(2020, 1, 1);
    let scenario = Scenario {
        name: "Worst case".to_string(),
        events: vec![EventKind::Covid19, EventKind::EconomicRecession],
        custom_shocks: vec![CustomShock {
            period: Quarter::new(2020, 1).unwrap(),
            impact: -0.5,
        }],
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    assert!(outcome.total_impact_pct[0] < -100.0);
    assert_eq!(outcome.adjusted_forecast[0], 0.0);
}

#[test]
fn test_positive_event_boosts_forecast() {
    let base = vec![1000.0];
    let quarters = quarters_from(2028, 3, 1);
    let scenario = Scenario {
        name: "Olympics".to_string(),
        events: vec![EventKind::MajorEvent],
        custom_shocks: Vec::new(),
    };

    let outcome = scenario::simulate(&base, &quarters, &scenario).unwrap();
    // +0.5 at full severity in 2028Q3
    assert_relative_eq!(outcome.adjusted_forecast[0], 1500.0, max_relative = 1e-9);
    assert_relative_eq!(outcome.summary.max_positive_impact_pct, 50.0, max_relative = 1e-9);
}

#[test]
fn test_simulate_input_validation() {
    let scenario = Scenario {
        name: "Baseline".to_string(),
        events: Vec::new(),
        custom_shocks: Vec::new(),
    };
    assert!(scenario::simulate(&[1.0], &quarters_from(2024, 1, 2), &scenario).is_err());
    assert!(scenario::simulate(&[], &[], &scenario).is_err());
}

#[test]
fn test_predefined_scenarios() {
    let templates = predefined_scenarios();
    let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
    for id in [
        "optimistic",
        "baseline",
        "pessimistic",
        "wildfire_season",
        "olympics_2028",
        "regulatory_crackdown",
    ] {
        assert!(ids.contains(&id));
    }

    // Every bundled shock respects the impact bounds
    for template in &templates {
        for shock in &template.custom_shocks {
            shock.validate().unwrap();
        }
    }

    let wildfire = find_scenario("wildfire_season").unwrap();
    assert_eq!(wildfire.custom_shocks.len(), 2);
    assert!(find_scenario("unknown").is_none());
}
