//! Core simulation types: run configuration, live state, and step records.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::devices::occupancy::Occupancy;
use crate::sim::clock::Clock;

/// Immutable per-run parameters.
///
/// Created once at load time and never mutated; the manager derives its
/// clock and initial [`SystemState`] from it.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use heatgrid_cosim::sim::types::SimulationConfig;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .expect("valid date");
/// let cfg = SimulationConfig {
///     label: "doc".into(),
///     start,
///     end: start + TimeDelta::days(1),
///     step: TimeDelta::minutes(15),
///     seed: 42,
///     initial_power_setpoint_kw: 6.0,
///     initial_room_temperature_c: 19.0,
///     initial_ev_power_kw: 0.0,
/// };
/// assert_eq!(cfg.total_steps(), 96);
/// assert_eq!(cfg.dt_hours(), 0.25);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Scenario name used in logs and reports.
    pub label: String,
    /// Timestamp of the first step.
    pub start: NaiveDateTime,
    /// End of the horizon (exclusive).
    pub end: NaiveDateTime,
    /// Step size `Δt`.
    pub step: TimeDelta,
    /// Seed of the occupancy random source.
    pub seed: u64,
    /// Flexible-load setpoint used by the first grid call (kW).
    pub initial_power_setpoint_kw: f64,
    /// Room temperature before the first step (°C).
    pub initial_room_temperature_c: f64,
    /// EV charging power before the first step (kW).
    pub initial_ev_power_kw: f64,
}

impl SimulationConfig {
    /// Clock covering `[start, end)` in steps of `step`.
    pub fn clock(&self) -> Clock {
        Clock::spanning(self.start, self.end, self.step)
    }

    /// Number of steps, `(end - start) / Δt`.
    pub fn total_steps(&self) -> usize {
        self.clock().total_steps()
    }

    /// Step size in hours.
    pub fn dt_hours(&self) -> f64 {
        self.step.num_seconds() as f64 / 3600.0
    }
}

/// The live snapshot advanced by the manager, one step at a time.
///
/// `power_setpoint_kw` is only ever replaced by the controller's decision,
/// once per step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemState {
    /// Flexible-load setpoint (kW).
    pub power_setpoint_kw: f64,
    /// Voltage at the flexible consumer's node; 0 until the first grid call.
    pub voltage: f64,
    /// Room temperature (°C).
    pub room_temperature_c: f64,
    /// EV charging power (kW), within `[0, cap]`.
    pub ev_power_kw: f64,
    pub occupancy: Occupancy,
    /// Heat delivered by the heat pump (kW).
    pub heat_production_kw: f64,
}

impl SystemState {
    /// State before the first step of a run.
    pub fn initial(config: &SimulationConfig) -> Self {
        Self {
            power_setpoint_kw: config.initial_power_setpoint_kw,
            voltage: 0.0,
            room_temperature_c: config.initial_room_temperature_c,
            ev_power_kw: config.initial_ev_power_kw,
            occupancy: Occupancy::Home,
            heat_production_kw: 0.0,
        }
    }
}

/// Everything observed or derived during one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    /// Step index.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    /// Setpoint applied to the grid and heat pump during this step (kW).
    pub power_setpoint_kw: f64,
    /// Setpoint decided for the next step (kW).
    pub next_power_setpoint_kw: f64,
    pub voltage: f64,
    pub heat_production_kw: f64,
    pub room_temperature_c: f64,
    pub ev_power_kw: f64,
    pub occupancy: Occupancy,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} ({}) | setpoint={:>7.2} -> {:>7.2} kW | V={:.4} | \
             heat={:.2} kW  room={:.2} °C | ev={:.2} kW | {}",
            self.index,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.power_setpoint_kw,
            self.next_power_setpoint_kw,
            self.voltage,
            self.heat_production_kw,
            self.room_temperature_c,
            self.ev_power_kw,
            if self.occupancy.is_away() { "away" } else { "home" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cfg() -> SimulationConfig {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        SimulationConfig {
            label: "test".into(),
            start,
            end: start + TimeDelta::days(3),
            step: TimeDelta::minutes(30),
            seed: 0,
            initial_power_setpoint_kw: 4.0,
            initial_room_temperature_c: 18.0,
            initial_ev_power_kw: 1.0,
        }
    }

    #[test]
    fn total_steps_follows_horizon() {
        let c = cfg();
        assert_eq!(c.total_steps(), 144);
        assert_eq!(c.dt_hours(), 0.5);
    }

    #[test]
    fn initial_state_copies_config() {
        let s = SystemState::initial(&cfg());
        assert_eq!(s.power_setpoint_kw, 4.0);
        assert_eq!(s.room_temperature_c, 18.0);
        assert_eq!(s.ev_power_kw, 1.0);
        assert_eq!(s.occupancy, Occupancy::Home);
    }

    #[test]
    fn step_record_display_does_not_panic() {
        let r = StepRecord {
            index: 3,
            timestamp: cfg().start,
            power_setpoint_kw: 4.0,
            next_power_setpoint_kw: 4.5,
            voltage: 0.97,
            heat_production_kw: 2.0,
            room_temperature_c: 19.2,
            ev_power_kw: 0.5,
            occupancy: Occupancy::Away,
        };
        let s = format!("{r}");
        assert!(s.contains("away"));
    }
}
