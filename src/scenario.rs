//! Scenario simulation: adjust a baseline forecast by named event impacts

use crate::data::Quarter;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of exogenous events that can shock a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Covid19,
    Wildfire,
    ExtremeWeather,
    EconomicRecession,
    MajorEvent,
    RegulatoryChange,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Covid19,
        EventKind::Wildfire,
        EventKind::ExtremeWeather,
        EventKind::EconomicRecession,
        EventKind::MajorEvent,
        EventKind::RegulatoryChange,
    ];

    /// Wire label, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Covid19 => "covid_19",
            EventKind::Wildfire => "wildfire",
            EventKind::ExtremeWeather => "extreme_weather",
            EventKind::EconomicRecession => "economic_recession",
            EventKind::MajorEvent => "major_event",
            EventKind::RegulatoryChange => "regulatory_change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        EventKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| ForecastError::ScenarioError(format!("Invalid event type: {}", s)))
    }
}

/// A window of quarters during which an event was (or will be) active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPeriod {
    pub start: Quarter,
    pub end: Quarter,
    /// Severity within the period, in [0, 1]
    pub severity: f64,
}

impl HistoricalPeriod {
    fn contains(&self, quarter: Quarter) -> bool {
        self.start <= quarter && quarter <= self.end
    }
}

/// Full definition of an exogenous event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    pub kind: EventKind,
    pub name: String,
    pub description: String,
    /// Peak impact on the forecast as a decimal (-0.6 = -60%)
    pub impact_multiplier: f64,
    pub historical_periods: Vec<HistoricalPeriod>,
    /// Per quarter-of-year intensity, for recurring events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_pattern: Option<[f64; 4]>,
}

impl EventDefinition {
    /// Impact of this event on a single forecast quarter. A matching
    /// historical period takes precedence over the seasonal pattern.
    fn impact_at(&self, quarter: Quarter) -> f64 {
        for period in &self.historical_periods {
            if period.contains(quarter) {
                return period.severity * self.impact_multiplier;
            }
        }
        if let Some(pattern) = &self.seasonal_pattern {
            return pattern[quarter.of_year() as usize - 1] * self.impact_multiplier;
        }
        0.0
    }
}

fn period(start: (i32, u8), end: (i32, u8), severity: f64) -> HistoricalPeriod {
    HistoricalPeriod {
        start: Quarter::new(start.0, start.1).expect("static quarter"),
        end: Quarter::new(end.0, end.1).expect("static quarter"),
        severity,
    }
}

/// Static catalog of event definitions
pub fn event_catalog() -> Vec<EventDefinition> {
    vec![
        EventDefinition {
            kind: EventKind::Covid19,
            name: "COVID-19 Pandemic".to_string(),
            description: "Impact of COVID-19 on travel and short-term rentals".to_string(),
            impact_multiplier: -0.6,
            historical_periods: vec![
                period((2020, 1), (2021, 2), 0.8),
                period((2021, 3), (2022, 4), 0.4),
            ],
            seasonal_pattern: None,
        },
        EventDefinition {
            kind: EventKind::Wildfire,
            name: "LA Wildfires".to_string(),
            description: "Major wildfire events affecting the LA area".to_string(),
            impact_multiplier: -0.3,
            historical_periods: vec![
                period((2020, 3), (2020, 4), 0.6),
                period((2023, 3), (2023, 3), 0.4),
            ],
            seasonal_pattern: None,
        },
        EventDefinition {
            kind: EventKind::ExtremeWeather,
            name: "Extreme Weather Events".to_string(),
            description: "Heat waves, storms, atmospheric rivers".to_string(),
            impact_multiplier: -0.15,
            historical_periods: Vec::new(),
            // Winter storms in Q1, heat waves in Q3
            seasonal_pattern: Some([0.3, 0.2, 0.5, 0.2]),
        },
        EventDefinition {
            kind: EventKind::EconomicRecession,
            name: "Economic Recession".to_string(),
            description: "Economic downturn affecting travel spending".to_string(),
            impact_multiplier: -0.4,
            historical_periods: vec![
                period((2008, 1), (2009, 4), 0.9),
                period((2020, 1), (2020, 2), 0.7),
            ],
            seasonal_pattern: None,
        },
        EventDefinition {
            kind: EventKind::MajorEvent,
            name: "Major Events (Olympics, Concerts, etc.)".to_string(),
            description: "Large events driving tourism".to_string(),
            impact_multiplier: 0.5,
            historical_periods: vec![period((2028, 3), (2028, 3), 1.0)],
            seasonal_pattern: None,
        },
        EventDefinition {
            kind: EventKind::RegulatoryChange,
            name: "Airbnb Regulation Changes".to_string(),
            description: "New laws restricting or enabling short-term rentals".to_string(),
            impact_multiplier: -0.25,
            historical_periods: vec![period((2019, 1), (2019, 4), 0.6)],
            seasonal_pattern: None,
        },
    ]
}

/// A shock applied to a single forecast quarter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomShock {
    pub period: Quarter,
    /// Impact as a decimal, within [-1.0, 2.0]
    pub impact: f64,
}

impl CustomShock {
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=2.0).contains(&self.impact) {
            return Err(ForecastError::ScenarioError(format!(
                "Shock impact must be within [-1.0, 2.0], got {}",
                self.impact
            )));
        }
        Ok(())
    }
}

/// A scenario: a set of enabled events plus optional custom shocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub events: Vec<EventKind>,
    #[serde(default)]
    pub custom_shocks: Vec<CustomShock>,
}

/// Predefined scenario template exposed through the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub events: Vec<EventKind>,
    pub custom_shocks: Vec<CustomShock>,
}

impl From<&ScenarioTemplate> for Scenario {
    fn from(template: &ScenarioTemplate) -> Self {
        Scenario {
            name: template.name.clone(),
            events: template.events.clone(),
            custom_shocks: template.custom_shocks.clone(),
        }
    }
}

fn shock(year: i32, quarter: u8, impact: f64) -> CustomShock {
    CustomShock {
        period: Quarter::new(year, quarter).expect("static quarter"),
        impact,
    }
}

/// Predefined scenario templates
pub fn predefined_scenarios() -> Vec<ScenarioTemplate> {
    vec![
        ScenarioTemplate {
            id: "optimistic".to_string(),
            name: "Optimistic Growth".to_string(),
            description: "Major events drive tourism, no major disruptions".to_string(),
            events: vec![EventKind::MajorEvent],
            custom_shocks: Vec::new(),
        },
        ScenarioTemplate {
            id: "baseline".to_string(),
            name: "Baseline (Status Quo)".to_string(),
            description: "Normal market conditions".to_string(),
            events: Vec::new(),
            custom_shocks: Vec::new(),
        },
        ScenarioTemplate {
            id: "pessimistic".to_string(),
            name: "Pessimistic (Multiple Disruptions)".to_string(),
            description: "Economic downturn + wildfires + extreme weather".to_string(),
            events: vec![
                EventKind::EconomicRecession,
                EventKind::Wildfire,
                EventKind::ExtremeWeather,
            ],
            custom_shocks: Vec::new(),
        },
        ScenarioTemplate {
            id: "wildfire_season".to_string(),
            name: "Severe Wildfire Season".to_string(),
            description: "Extended wildfire season affecting LA".to_string(),
            events: vec![EventKind::Wildfire],
            custom_shocks: vec![shock(2024, 3, -0.35), shock(2024, 4, -0.20)],
        },
        ScenarioTemplate {
            id: "olympics_2028".to_string(),
            name: "2028 LA Olympics".to_string(),
            description: "Surge in demand for the 2028 Olympics".to_string(),
            events: vec![EventKind::MajorEvent],
            custom_shocks: vec![shock(2028, 2, 0.6), shock(2028, 3, 0.8)],
        },
        ScenarioTemplate {
            id: "regulatory_crackdown".to_string(),
            name: "Strict Regulation".to_string(),
            description: "New laws restrict short-term rentals".to_string(),
            events: vec![EventKind::RegulatoryChange],
            custom_shocks: vec![shock(2024, 1, -0.30)],
        },
    ]
}

/// Look up a predefined scenario by id
pub fn find_scenario(id: &str) -> Option<ScenarioTemplate> {
    predefined_scenarios().into_iter().find(|s| s.id == id)
}

/// Summary statistics over the per-quarter impacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub avg_impact_pct: f64,
    pub max_negative_impact_pct: f64,
    pub max_positive_impact_pct: f64,
    pub events_included: Vec<EventKind>,
}

/// Result of a scenario simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario_name: String,
    pub base_forecast: Vec<f64>,
    pub adjusted_forecast: Vec<f64>,
    /// Per-quarter total impact in percent
    pub total_impact_pct: Vec<f64>,
    pub summary: ImpactSummary,
}

/// Apply a scenario's event impacts and custom shocks to a baseline
/// forecast. Adjusted values are clamped at zero: stacked shocks can push
/// the combined impact below -100%.
pub fn simulate(
    base_forecast: &[f64],
    quarters: &[Quarter],
    scenario: &Scenario,
) -> Result<ScenarioOutcome> {
    if base_forecast.len() != quarters.len() {
        return Err(ForecastError::ScenarioError(format!(
            "Base forecast length ({}) doesn't match quarters length ({})",
            base_forecast.len(),
            quarters.len()
        )));
    }
    if base_forecast.is_empty() {
        return Err(ForecastError::ScenarioError(
            "Base forecast is empty".to_string(),
        ));
    }
    for shock in &scenario.custom_shocks {
        shock.validate()?;
    }

    let catalog = event_catalog();
    let enabled: Vec<&EventDefinition> = catalog
        .iter()
        .filter(|def| scenario.events.contains(&def.kind))
        .collect();

    let mut total_impact = vec![0.0; quarters.len()];
    for (i, quarter) in quarters.iter().enumerate() {
        for event in &enabled {
            total_impact[i] += event.impact_at(*quarter);
        }
    }

    // Shocks pinned to quarters outside the forecast window are ignored
    for shock in &scenario.custom_shocks {
        if let Some(i) = quarters.iter().position(|q| *q == shock.period) {
            total_impact[i] += shock.impact;
        }
    }

    let adjusted_forecast: Vec<f64> = base_forecast
        .iter()
        .zip(total_impact.iter())
        .map(|(base, impact)| (base * (1.0 + impact)).max(0.0))
        .collect();

    let n = total_impact.len() as f64;
    let avg = total_impact.iter().sum::<f64>() / n;
    let max_negative = total_impact.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_positive = total_impact
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(ScenarioOutcome {
        scenario_name: scenario.name.clone(),
        base_forecast: base_forecast.to_vec(),
        adjusted_forecast,
        total_impact_pct: total_impact.iter().map(|i| i * 100.0).collect(),
        summary: ImpactSummary {
            avg_impact_pct: avg * 100.0,
            max_negative_impact_pct: max_negative * 100.0,
            max_positive_impact_pct: max_positive * 100.0,
            events_included: scenario.events.clone(),
        },
    })
}
