use crate::devices::occupancy::Occupancy;
use crate::devices::types::{EvInput, EvOutput, Process};
use crate::error::SimError;

/// Charging phase derived from the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargePhase {
    /// Occupant away; charging stopped and reset.
    Away,
    /// Home and ramping towards the cap.
    Charging,
    /// Home with power held at the cap.
    IdleFull,
}

/// An EV charger whose power ramps in fixed increments while the occupant is home.
///
/// Step rule, given the previous power `p`:
/// - away: `0` (charging resets, nothing is remembered across the away period)
/// - home and `p < cap`: `min(p + charge_step, cap)`
/// - home and `p >= cap`: `p` held at the cap
///
/// # Power Flow Convention (Feeder)
/// Returns **positive** values (consumption / load on feeder), always in `[0, cap]`.
#[derive(Debug, Clone)]
pub struct EvCharger {
    /// Maximum charging power in kilowatts.
    pub power_cap_kw: f64,

    /// Ramp increment per home step in kilowatts.
    pub charge_step_kw: f64,

    phase: ChargePhase,
}

impl EvCharger {
    /// Creates a new EV charger.
    ///
    /// # Arguments
    ///
    /// * `power_cap_kw` - Maximum charging power (must be >= 0)
    /// * `charge_step_kw` - Ramp increment per home step (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `power_cap_kw` < 0 or `charge_step_kw` <= 0.
    pub fn new(power_cap_kw: f64, charge_step_kw: f64) -> Self {
        assert!(power_cap_kw >= 0.0);
        assert!(charge_step_kw > 0.0);

        Self {
            power_cap_kw,
            charge_step_kw,
            phase: ChargePhase::Away,
        }
    }

    /// Applies the step rule and records the resulting phase.
    pub fn step(&mut self, previous_power_kw: f64, occupancy: Occupancy) -> f64 {
        let cap = self.power_cap_kw;
        let (phase, power) = match occupancy {
            Occupancy::Away => (ChargePhase::Away, 0.0),
            Occupancy::Home if previous_power_kw < cap => {
                let next = (previous_power_kw.max(0.0) + self.charge_step_kw).min(cap);
                let phase = if next >= cap {
                    ChargePhase::IdleFull
                } else {
                    ChargePhase::Charging
                };
                (phase, next)
            }
            Occupancy::Home => (ChargePhase::IdleFull, cap),
        };
        self.phase = phase;
        power
    }

    /// Phase reached by the most recent step.
    pub fn phase(&self) -> ChargePhase {
        self.phase
    }

    /// Forgets the last phase (scenario reset).
    pub fn reset(&mut self) {
        self.phase = ChargePhase::Away;
    }
}

impl Process for EvCharger {
    type Input = EvInput;
    type Output = EvOutput;

    fn process(&mut self, input: &EvInput) -> Result<EvOutput, SimError> {
        Ok(EvOutput {
            power_kw: self.step(input.previous_power_kw, input.occupancy),
        })
    }

    fn process_name(&self) -> &'static str {
        "EvCharger"
    }
}
