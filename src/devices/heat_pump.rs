use crate::devices::types::{HeatPumpInput, HeatPumpOutput, Process};
use crate::error::SimError;

/// Stateless heat pump: heat output proportional to the electrical setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPump {
    /// Heat delivered per unit of electrical setpoint.
    pub heat_per_kw: f64,
}

impl HeatPump {
    pub fn new(heat_per_kw: f64) -> Self {
        Self { heat_per_kw }
    }

    /// Heat production for the given setpoint.
    pub fn heat_production_kw(&self, power_setpoint_kw: f64) -> f64 {
        self.heat_per_kw * power_setpoint_kw
    }
}

impl Default for HeatPump {
    fn default() -> Self {
        Self { heat_per_kw: 0.5 }
    }
}

impl Process for HeatPump {
    type Input = HeatPumpInput;
    type Output = HeatPumpOutput;

    fn process(&mut self, input: &HeatPumpInput) -> Result<HeatPumpOutput, SimError> {
        Ok(HeatPumpOutput {
            heat_production_kw: self.heat_production_kw(input.power_setpoint_kw),
        })
    }

    fn process_name(&self) -> &'static str {
        "HeatPump"
    }
}
