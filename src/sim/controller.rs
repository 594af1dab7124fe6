//! Priority-based setpoint controller.

use std::fmt;

use tracing::debug;

use super::types::SystemState;

/// Temperature bounds (°C).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComfortBand {
    pub temperature_min: f64,
    pub temperature_max: f64,
}

/// Extra setpoint increment applied alongside a temperature correction while
/// the occupant is home and the EV draws less than `below_kw`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvBoost {
    pub step_kw: f64,
    pub below_kw: f64,
}

/// Immutable thresholds and step sizes shared read-only across all steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub voltage_min: f64,
    pub voltage_max: f64,
    /// Nominal comfort band, used while home (and while away if `away_band` is unset).
    pub temperature_min: f64,
    pub temperature_max: f64,
    /// Fixed setpoint change for a voltage correction (kW).
    pub power_step_voltage: f64,
    /// Fixed setpoint change for a temperature correction (kW).
    pub power_step_temperature: f64,
    /// Widened comfort band used while the occupant is away.
    pub away_band: Option<ComfortBand>,
    pub ev_boost: Option<EvBoost>,
}

impl ControllerSettings {
    /// Comfort band in effect for the given state.
    pub fn comfort_band(&self, state: &SystemState) -> ComfortBand {
        match self.away_band {
            Some(band) if state.occupancy.is_away() => band,
            _ => ComfortBand {
                temperature_min: self.temperature_min,
                temperature_max: self.temperature_max,
            },
        }
    }

    /// `true` when `voltage_min <= voltage <= voltage_max`.
    pub fn voltage_in_bounds(&self, voltage: f64) -> bool {
        (self.voltage_min..=self.voltage_max).contains(&voltage)
    }
}

/// Which rule fired in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    None,
    VoltageLow,
    VoltageHigh,
    TemperatureHigh,
    TemperatureLow,
}

impl Correction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::VoltageLow => "voltage_low",
            Self::VoltageHigh => "voltage_high",
            Self::TemperatureHigh => "temperature_high",
            Self::TemperatureLow => "temperature_low",
        }
    }

    pub fn is_voltage(self) -> bool {
        matches!(self, Self::VoltageLow | Self::VoltageHigh)
    }

    pub fn is_temperature(self) -> bool {
        matches!(self, Self::TemperatureHigh | Self::TemperatureLow)
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one controller evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub correction: Correction,
    /// Whether the EV boost was added on top of a temperature correction.
    pub ev_boosted: bool,
    pub power_setpoint_kw: f64,
}

/// Computes the next flexible-load setpoint from the current state.
pub trait Controller {
    fn decide(&self, state: &SystemState, settings: &ControllerSettings) -> f64;
}

/// Stateless two-tier rule controller.
///
/// 1. Voltage (always evaluated): below `voltage_min` lowers the setpoint by
///    `power_step_voltage`, above `voltage_max` raises it by the same step.
/// 2. Temperature (only when voltage is within bounds): above the comfort
///    band lowers the setpoint by `power_step_temperature`, below raises it.
///
/// Grid voltage takes precedence over comfort: when tier 1 fires, tier 2 is
/// skipped for that step.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedController;

impl RuleBasedController {
    /// Evaluates both tiers without logging.
    pub fn evaluate(&self, state: &SystemState, settings: &ControllerSettings) -> Decision {
        let mut setpoint = state.power_setpoint_kw;
        let v = state.voltage;

        let correction = if v < settings.voltage_min {
            setpoint -= settings.power_step_voltage;
            Correction::VoltageLow
        } else if v > settings.voltage_max {
            setpoint += settings.power_step_voltage;
            Correction::VoltageHigh
        } else if settings.voltage_in_bounds(v) {
            let band = settings.comfort_band(state);
            if state.room_temperature_c > band.temperature_max {
                setpoint -= settings.power_step_temperature;
                Correction::TemperatureHigh
            } else if state.room_temperature_c < band.temperature_min {
                setpoint += settings.power_step_temperature;
                Correction::TemperatureLow
            } else {
                Correction::None
            }
        } else {
            // NaN voltage: neither tier applies.
            Correction::None
        };

        let boost = settings.ev_boost.filter(|b| {
            correction.is_temperature()
                && !state.occupancy.is_away()
                && state.ev_power_kw < b.below_kw
        });
        if let Some(b) = boost {
            setpoint += b.step_kw;
        }

        Decision {
            correction,
            ev_boosted: boost.is_some(),
            power_setpoint_kw: setpoint,
        }
    }
}

impl Controller for RuleBasedController {
    fn decide(&self, state: &SystemState, settings: &ControllerSettings) -> f64 {
        let decision = self.evaluate(state, settings);
        debug!(
            correction = %decision.correction,
            ev_boosted = decision.ev_boosted,
            voltage = state.voltage,
            temperature_c = state.room_temperature_c,
            from_kw = state.power_setpoint_kw,
            to_kw = decision.power_setpoint_kw,
            "controller decision"
        );
        decision.power_setpoint_kw
    }
}
