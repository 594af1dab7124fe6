use chrono::{NaiveDateTime, Timelike};

use crate::devices::types::{Process, RoomInput, RoomOutput};
use crate::error::SimError;

/// Outside air temperature seen by the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmbientProfile {
    /// Fixed outside temperature (°C).
    Constant(f64),
    /// Cosine day cycle: `mean + amplitude * cos(2π (hour - peak_hour) / 24)`.
    Diurnal {
        mean_c: f64,
        amplitude_c: f64,
        peak_hour: f64,
    },
}

impl AmbientProfile {
    /// Outside temperature at `t` (°C).
    pub fn temperature_at(&self, t: NaiveDateTime) -> f64 {
        match *self {
            Self::Constant(c) => c,
            Self::Diurnal {
                mean_c,
                amplitude_c,
                peak_hour,
            } => {
                let hour = f64::from(t.hour())
                    + f64::from(t.minute()) / 60.0
                    + f64::from(t.second()) / 3600.0;
                let angle = 2.0 * std::f64::consts::PI * (hour - peak_hour) / 24.0;
                mean_c + amplitude_c * angle.cos()
            }
        }
    }
}

/// Fixed parameters of the single-node RC room model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomParams {
    /// Thermal capacitance `C_room` (energy per kelvin, e.g. kWh/K).
    pub thermal_capacitance: f64,
    /// Thermal resistance `R_thermal` to the outside (K per kW).
    pub thermal_resistance: f64,
    /// Integration step `Δt`, in the time unit of `thermal_capacitance`.
    pub dt: f64,
    pub ambient: AmbientProfile,
}

/// A single-capacitance, single-resistance room integrated with explicit Euler.
///
/// Each step applies
///
/// ```text
///   heat_loss = (T_room - T_outside) / R_thermal
///   T_room   += Δt * (heat_input - heat_loss) / C_room
/// ```
///
/// No stability guard is applied: explicit Euler only decays monotonically
/// for `Δt < R·C` and stays bounded for `Δt < 2·R·C`. Choosing `Δt` is the
/// caller's responsibility; [`Room::is_numerically_stable`] reports it.
#[derive(Debug, Clone)]
pub struct Room {
    params: RoomParams,
    temperature_c: f64,
}

impl Room {
    /// Creates a room at the given initial temperature.
    pub fn new(params: RoomParams, initial_temperature_c: f64) -> Self {
        Self {
            params,
            temperature_c: initial_temperature_c,
        }
    }

    /// Advances one step with the given heat input and outside temperature.
    ///
    /// # Returns
    ///
    /// The room temperature after the step (°C).
    pub fn update(&mut self, heat_input: f64, outside_temperature_c: f64) -> f64 {
        let p = &self.params;
        let heat_loss = (self.temperature_c - outside_temperature_c) / p.thermal_resistance;
        self.temperature_c += p.dt * (heat_input - heat_loss) / p.thermal_capacitance;
        self.temperature_c
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Overwrites the carried temperature (scenario reset).
    pub fn set_temperature_c(&mut self, temperature_c: f64) {
        self.temperature_c = temperature_c;
    }

    pub fn params(&self) -> &RoomParams {
        &self.params
    }

    /// `true` when `Δt` is below the explicit-Euler bound `2·R·C`.
    pub fn is_numerically_stable(&self) -> bool {
        let p = &self.params;
        p.dt < 2.0 * p.thermal_resistance * p.thermal_capacitance
    }
}

impl Process for Room {
    type Input = RoomInput;
    type Output = RoomOutput;

    fn process(&mut self, input: &RoomInput) -> Result<RoomOutput, SimError> {
        let outside = self.params.ambient.temperature_at(input.timestamp);
        Ok(RoomOutput {
            temperature_c: self.update(input.heat_input_kw, outside),
        })
    }

    fn process_name(&self) -> &'static str {
        "Room"
    }
}
