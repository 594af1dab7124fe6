//! Scenario wiring: loads datasets, builds managers, and runs the observed
//! and forecasted variants side by side.

use std::thread;

use serde::Serialize;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::devices::HeatPump;
use crate::error::SimError;
use crate::forecast::NaiveForecast;
use crate::grid::{LoadTable, RadialFeeder, Topology};
use crate::sim::controller::RuleBasedController;
use crate::sim::kpi::KpiReport;
use crate::sim::manager::Manager;
use crate::sim::results::{Comparison, ResultSeries};

/// Manager over the radial feeder stand-in with the rule-based controller.
pub type FeederManager = Manager<RadialFeeder, HeatPump, RuleBasedController>;

/// Datasets shared by both runs of a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    pub observed: LoadTable,
    pub forecast: LoadTable,
    pub topology: Topology,
}

impl ScenarioInputs {
    /// Reads the load tables and topology named by the scenario.
    ///
    /// Without a forecast file, the forecast is the observed table shifted
    /// by one day.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingDataset` for absent files and a CSV or
    /// malformed-dataset error for unreadable ones.
    pub fn load(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        let observed = LoadTable::from_csv_path(&cfg.data.observed_loads)?;
        let forecast = match &cfg.data.forecast_loads {
            Some(path) => LoadTable::from_csv_path(path)?,
            None => {
                let forecaster = NaiveForecast::default();
                info!(
                    lag_hours = forecaster.lag().num_hours(),
                    "no forecast dataset configured; using lagged observed loads"
                );
                forecaster.forecast(&observed)
            }
        };
        let topology = Topology::from_csv_path(&cfg.data.topology)?;
        info!(
            consumers = observed.consumers().len(),
            rows = observed.len(),
            lines = topology.lines().len(),
            "datasets loaded"
        );
        Ok(Self {
            observed,
            forecast,
            topology,
        })
    }
}

/// Builds a manager for one load table.
///
/// # Errors
///
/// Fails fast if the feeder cannot be built or the table does not cover
/// every step of the horizon.
pub fn build_manager(
    cfg: &ScenarioConfig,
    loads: LoadTable,
    topology: Topology,
) -> Result<FeederManager, SimError> {
    let clock = cfg.simulation.clock();
    if let Some(t) = clock.timestamps().find(|t| loads.row(*t).is_none()) {
        return Err(SimError::MissingTimestamp(t));
    }

    let grid = RadialFeeder::new(
        loads,
        topology,
        &cfg.data.flexible_consumer,
        cfg.grid.rated_voltage_v,
        cfg.grid.power_factor,
    )?;

    Ok(Manager::new(
        cfg.simulation.clone(),
        cfg.controller.clone(),
        grid,
        cfg.heat_pump_model(),
        cfg.room_model(),
        cfg.ev_charger(),
        cfg.occupancy_schedule(),
        RuleBasedController,
    ))
}

/// Results of a scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub observed: ResultSeries,
    pub forecast: Option<ResultSeries>,
    /// Forecast run compared against the observed baseline.
    pub comparison: Option<Comparison>,
}

impl ScenarioOutcome {
    /// KPI summary of both runs.
    pub fn summary(&self, cfg: &ScenarioConfig) -> RunSummary {
        let dt = cfg.simulation.dt_hours();
        RunSummary {
            scenario: cfg.simulation.label.clone(),
            observed: KpiReport::from_series(&self.observed, &cfg.controller, dt),
            forecast: self
                .forecast
                .as_ref()
                .map(|s| KpiReport::from_series(s, &cfg.controller, dt)),
            comparison: self.comparison.clone(),
        }
    }
}

/// Serializable scenario summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub observed: KpiReport,
    pub forecast: Option<KpiReport>,
    pub comparison: Option<Comparison>,
}

/// Runs the scenario on the observed loads only.
///
/// # Errors
///
/// Propagates dataset, build, and step failures.
pub fn run_observed(cfg: &ScenarioConfig) -> Result<ScenarioOutcome, SimError> {
    let inputs = ScenarioInputs::load(cfg)?;
    let mut manager = build_manager(cfg, inputs.observed, inputs.topology)?;
    let observed = manager.run()?;
    Ok(ScenarioOutcome {
        observed,
        forecast: None,
        comparison: None,
    })
}

/// Runs the observed and forecasted variants in parallel and compares them.
///
/// The two managers share no mutable state and draw the same occupancy
/// schedule from the scenario seed. The observed run becomes the stored
/// baseline of the observed manager; the forecast run is compared against it.
///
/// # Errors
///
/// Propagates dataset, build, step, and comparison failures.
pub fn run_scenario_pair(cfg: &ScenarioConfig) -> Result<ScenarioOutcome, SimError> {
    let inputs = ScenarioInputs::load(cfg)?;
    let mut observed_mgr = build_manager(cfg, inputs.observed, inputs.topology.clone())?;
    let mut forecast_mgr = build_manager(cfg, inputs.forecast, inputs.topology)?;

    let (observed, forecast) = thread::scope(|s| {
        let handle = s.spawn(|| forecast_mgr.run());
        let observed = observed_mgr.run();
        let forecast = match handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (observed, forecast)
    });
    let (observed, forecast) = (observed?, forecast?);

    observed_mgr.store_results(observed.clone());
    let comparison = observed_mgr.compare_results(&forecast)?;

    Ok(ScenarioOutcome {
        observed,
        forecast: Some(forecast),
        comparison: Some(comparison),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::topology::Line;
    use crate::sim::results::Metric;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    const SCENARIO: &str = r#"
[simulation]
label = "runner"
start = "2024-01-01T00:00:00"
end = "2024-01-02T00:00:00"
step_minutes = 60
seed = 3
initial_power_setpoint_kw = 4.0
initial_room_temperature_c = 19.0

[data]
observed_loads = "unused.csv"
topology = "unused.csv"
flexible_consumer = "hp"

[heat_pump]
heat_per_kw = 0.5

[room]
thermal_capacitance = 5.0
thermal_resistance = 4.0
outside_temperature_c = 2.0

[ev]
power_cap_kw = 7.0
charge_step_kw = 1.0

[controller]
voltage_min = 0.95
voltage_max = 1.05
temperature_min = 19.0
temperature_max = 22.0
power_step_voltage = 1.0
power_step_temperature = 0.5
"#;

    fn hour(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
            + TimeDelta::hours(h)
    }

    fn loads(hours: i64) -> LoadTable {
        LoadTable::from_rows(
            vec!["a".into(), "hp".into()],
            (0..hours).map(|h| (hour(h), vec![1.0, 0.0])).collect(),
        )
    }

    fn topology() -> Topology {
        Topology::new(vec![
            Line {
                from: 1,
                to: 2,
                r_ohm: 0.05,
                x_ohm: 0.02,
                i_max_a: 200.0,
            },
            Line {
                from: 2,
                to: 3,
                r_ohm: 0.05,
                x_ohm: 0.02,
                i_max_a: 200.0,
            },
        ])
    }

    fn scenario() -> ScenarioConfig {
        ScenarioConfig::from_toml_str(SCENARIO).expect("fixture should resolve")
    }

    #[test]
    fn manager_runs_full_horizon() {
        let cfg = scenario();
        let mut mgr = build_manager(&cfg, loads(24), topology()).expect("manager should build");
        let series = mgr.run().expect("run");
        assert_eq!(series.len(), 24);
        assert!(series.values(Metric::Voltage).iter().all(|v| *v < 1.0 && *v > 0.9));
    }

    #[test]
    fn short_load_table_fails_fast() {
        let cfg = scenario();
        let err = build_manager(&cfg, loads(12), topology());
        assert!(matches!(err, Err(SimError::MissingTimestamp(t)) if t == hour(12)));
    }

    #[test]
    fn unknown_flexible_consumer_fails_fast() {
        let mut cfg = scenario();
        cfg.data.flexible_consumer = "nobody".into();
        let err = build_manager(&cfg, loads(24), topology());
        assert!(matches!(err, Err(SimError::UnknownConsumer(_))));
    }

    #[test]
    fn missing_dataset_is_reported() {
        let cfg = scenario();
        let err = run_observed(&cfg);
        assert!(matches!(err, Err(SimError::MissingDataset { .. })));
    }
}
