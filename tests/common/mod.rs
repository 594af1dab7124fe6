//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use heatgrid_cosim::config::ScenarioConfig;
use heatgrid_cosim::devices::room::{AmbientProfile, RoomParams};
use heatgrid_cosim::devices::{EvCharger, HeatPump, Occupancy, OccupancySchedule, Room};
use heatgrid_cosim::grid::InverseSetpointGrid;
use heatgrid_cosim::sim::controller::{ControllerSettings, RuleBasedController};
use heatgrid_cosim::sim::manager::Manager;
use heatgrid_cosim::sim::types::SimulationConfig;

pub const BASELINE_SCENARIO: &str = "scenarios/baseline.toml";
pub const PERSISTENCE_SCENARIO: &str = "scenarios/persistence_away.toml";

/// Midnight of 2024-01-01.
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Hourly run of `steps` steps starting at [`t0`] with setpoint 100.
pub fn hourly_config(steps: i64) -> SimulationConfig {
    SimulationConfig {
        label: "fixture".into(),
        start: t0(),
        end: t0() + TimeDelta::hours(steps),
        step: TimeDelta::hours(1),
        seed: 42,
        initial_power_setpoint_kw: 100.0,
        initial_room_temperature_c: 20.0,
        initial_ev_power_kw: 0.0,
    }
}

/// Voltage band 10..20 with a 70 kW voltage step, comfort 19..22.
pub fn inverse_settings() -> ControllerSettings {
    ControllerSettings {
        voltage_min: 10.0,
        voltage_max: 20.0,
        temperature_min: 19.0,
        temperature_max: 22.0,
        power_step_voltage: 70.0,
        power_step_temperature: 5.0,
        away_band: None,
        ev_boost: None,
    }
}

/// Room with C = 10, R = 2, outside 5 °C, one-hour step.
pub fn default_room() -> Room {
    Room::new(
        RoomParams {
            thermal_capacitance: 10.0,
            thermal_resistance: 2.0,
            dt: 1.0,
            ambient: AmbientProfile::Constant(5.0),
        },
        20.0,
    )
}

/// Manager over `5000 / setpoint` with the occupant always home.
pub fn inverse_manager(
    steps: i64,
) -> Manager<InverseSetpointGrid, HeatPump, RuleBasedController> {
    Manager::new(
        hourly_config(steps),
        inverse_settings(),
        InverseSetpointGrid::new(5000.0),
        HeatPump::default(),
        default_room(),
        EvCharger::new(25.0, 0.5),
        OccupancySchedule::from_statuses(vec![Occupancy::Home; steps as usize]),
        RuleBasedController,
    )
}

pub fn load_scenario(path: &str) -> ScenarioConfig {
    ScenarioConfig::from_toml_file(std::path::Path::new(path))
        .unwrap_or_else(|e| panic!("{path} should load: {e}"))
}
