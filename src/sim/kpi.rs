//! Post-hoc KPI computation from a completed result series.

use std::fmt;

use serde::Serialize;

use super::controller::ControllerSettings;
use super::results::{Metric, ResultSeries};

/// Aggregate key performance indicators derived from a complete run.
///
/// Computed post-hoc from a [`ResultSeries`] so the reported figures always
/// agree with the exported per-step data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub steps: usize,
    /// Lowest flexible-consumer voltage seen.
    pub min_voltage: f64,
    /// Highest flexible-consumer voltage seen.
    pub max_voltage: f64,
    /// Steps with voltage outside `[voltage_min, voltage_max]`.
    pub voltage_violation_steps: usize,
    pub mean_room_temperature_c: f64,
    pub min_room_temperature_c: f64,
    pub max_room_temperature_c: f64,
    /// Steps with room temperature outside the comfort band in effect.
    pub comfort_violation_steps: usize,
    /// Electrical energy commanded to the heat pump (kWh, sum of setpoint * dt).
    pub heat_pump_energy_kwh: f64,
    /// Heat delivered to the room (kWh).
    pub heat_delivered_kwh: f64,
    /// EV charging energy (kWh).
    pub ev_energy_kwh: f64,
    /// Share of steps with the occupant away (%).
    pub away_pct: f64,
    pub mean_setpoint_kw: f64,
    pub peak_setpoint_kw: f64,
}

impl KpiReport {
    /// Computes all KPIs from a completed run.
    ///
    /// # Arguments
    ///
    /// * `series` - Complete result series
    /// * `settings` - Controller thresholds used to count violations
    /// * `dt_hours` - Step duration in hours
    pub fn from_series(series: &ResultSeries, settings: &ControllerSettings, dt_hours: f64) -> Self {
        let steps = series.len();
        if steps == 0 {
            return Self {
                steps: 0,
                min_voltage: 0.0,
                max_voltage: 0.0,
                voltage_violation_steps: 0,
                mean_room_temperature_c: 0.0,
                min_room_temperature_c: 0.0,
                max_room_temperature_c: 0.0,
                comfort_violation_steps: 0,
                heat_pump_energy_kwh: 0.0,
                heat_delivered_kwh: 0.0,
                ev_energy_kwh: 0.0,
                away_pct: 0.0,
                mean_setpoint_kw: 0.0,
                peak_setpoint_kw: 0.0,
            };
        }

        let voltage = series.values(Metric::Voltage);
        let temperature = series.values(Metric::RoomTemperatureC);
        let occupancy = series.values(Metric::OccupancyStatus);

        let voltage_violation_steps = voltage
            .iter()
            .filter(|v| !settings.voltage_in_bounds(**v))
            .count();

        let mut comfort_violation_steps = 0;
        let mut away_steps = 0;
        for (temp, status) in temperature.iter().zip(occupancy) {
            let away = *status != 0.0;
            if away {
                away_steps += 1;
            }
            let (lo, hi) = match settings.away_band {
                Some(band) if away => (band.temperature_min, band.temperature_max),
                _ => (settings.temperature_min, settings.temperature_max),
            };
            if *temp < lo || *temp > hi {
                comfort_violation_steps += 1;
            }
        }

        let energy = |metric: Metric| series.values(metric).iter().sum::<f64>() * dt_hours;
        let (min_voltage, max_voltage) = min_max(voltage);
        let (min_room_temperature_c, max_room_temperature_c) = min_max(temperature);
        let (_, peak_setpoint_kw) = min_max(series.values(Metric::PowerSetpointKw));

        Self {
            steps,
            min_voltage,
            max_voltage,
            voltage_violation_steps,
            mean_room_temperature_c: series.mean(Metric::RoomTemperatureC).unwrap_or(0.0),
            min_room_temperature_c,
            max_room_temperature_c,
            comfort_violation_steps,
            heat_pump_energy_kwh: energy(Metric::PowerSetpointKw),
            heat_delivered_kwh: energy(Metric::HeatProductionKw),
            ev_energy_kwh: energy(Metric::EvPowerKw),
            away_pct: 100.0 * away_steps as f64 / steps as f64,
            mean_setpoint_kw: series.mean(Metric::PowerSetpointKw).unwrap_or(0.0),
            peak_setpoint_kw,
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ({} steps) ---", self.steps)?;
        writeln!(
            f,
            "Voltage range:         {:.4} .. {:.4} ({} violations)",
            self.min_voltage, self.max_voltage, self.voltage_violation_steps
        )?;
        writeln!(
            f,
            "Room temperature:      {:.2} °C mean, {:.2} .. {:.2} ({} out of band)",
            self.mean_room_temperature_c,
            self.min_room_temperature_c,
            self.max_room_temperature_c,
            self.comfort_violation_steps
        )?;
        writeln!(
            f,
            "Heat pump energy:      {:.2} kWh ({:.2} kWh heat)",
            self.heat_pump_energy_kwh, self.heat_delivered_kwh
        )?;
        writeln!(
            f,
            "Flexible setpoint:     {:.2} kW mean, {:.2} kW peak",
            self.mean_setpoint_kw, self.peak_setpoint_kw
        )?;
        writeln!(f, "EV charging energy:    {:.2} kWh", self.ev_energy_kwh)?;
        write!(f, "Occupant away:         {:.1}%", self.away_pct)
    }
}
