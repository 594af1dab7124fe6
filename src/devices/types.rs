//! Common invocation contract and exchange records for the coupled models.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDateTime;

use crate::devices::occupancy::Occupancy;
use crate::error::SimError;

/// Key under which every grid adapter reports the flexible consumer's voltage.
pub const SMART_CONSUMER: &str = "smart_consumer";

/// Trait giving every coupled model the same invocation shape.
///
/// Each role fixes `Input` and `Output` to a named record, so adding an
/// exchanged quantity changes a struct rather than an argument list. Stateless
/// models ignore `&mut self`; stateful ones (room, EV charger) advance their
/// memory on every call.
pub trait Process {
    /// Named inputs consumed by this model.
    type Input;
    /// Named outputs produced by this model.
    type Output;

    /// Runs the model for one step.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` when the inputs violate a precondition of the
    /// model (for example a degenerate setpoint in a voltage stand-in).
    fn process(&mut self, input: &Self::Input) -> Result<Self::Output, SimError>;

    /// Returns a human-readable name for logs.
    fn process_name(&self) -> &'static str;
}

/// Adapter wrapping a plain function or closure as a [`Process`].
///
/// The closure bound is checked when the adapter is built, so a value that
/// cannot be invoked with the role's record never reaches the step loop.
pub struct ProcessFn<F, I, O> {
    name: &'static str,
    f: F,
    _records: PhantomData<fn(&I) -> O>,
}

impl<F, I, O> ProcessFn<F, I, O>
where
    F: FnMut(&I) -> Result<O, SimError>,
{
    /// Wraps `f` under the given display name.
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            f,
            _records: PhantomData,
        }
    }
}

impl<F, I, O> Process for ProcessFn<F, I, O>
where
    F: FnMut(&I) -> Result<O, SimError>,
{
    type Input = I;
    type Output = O;

    fn process(&mut self, input: &I) -> Result<O, SimError> {
        (self.f)(input)
    }

    fn process_name(&self) -> &'static str {
        self.name
    }
}

impl<F, I, O> fmt::Debug for ProcessFn<F, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessFn").field("name", &self.name).finish()
    }
}

/// Inputs to a grid adapter for one timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInput {
    /// Timestamp to evaluate in the load table.
    pub timestamp: NaiveDateTime,
    /// Flexible-load setpoint injected at the flexible consumer (kW).
    pub flexible_setpoint_kw: f64,
}

/// Per-consumer voltages produced by a grid adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOutput {
    /// Voltage per consumer id; the flexible consumer is keyed [`SMART_CONSUMER`].
    pub voltages: BTreeMap<String, f64>,
}

impl GridOutput {
    /// Voltage measured at the flexible consumer, if reported.
    pub fn smart_consumer_voltage(&self) -> Option<f64> {
        self.voltages.get(SMART_CONSUMER).copied()
    }
}

/// Heat pump input: the commanded electrical setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPumpInput {
    pub power_setpoint_kw: f64,
}

/// Heat pump output: heat delivered to the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPumpOutput {
    pub heat_production_kw: f64,
}

/// Room input for one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomInput {
    /// Heat injected during the step (kW).
    pub heat_input_kw: f64,
    /// Step timestamp, used by time-varying ambient profiles.
    pub timestamp: NaiveDateTime,
}

/// Room output: temperature after the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomOutput {
    pub temperature_c: f64,
}

/// EV charger input for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvInput {
    /// Charging power from the previous step (kW).
    pub previous_power_kw: f64,
    /// Occupancy at the current step.
    pub occupancy: Occupancy,
}

/// EV charger output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvOutput {
    pub power_kw: f64,
}

/// Role marker for grid adapters.
pub trait GridAdapter: Process<Input = GridInput, Output = GridOutput> {}

impl<T> GridAdapter for T where T: Process<Input = GridInput, Output = GridOutput> {}

/// Role marker for heat pump models.
pub trait HeatPumpModel: Process<Input = HeatPumpInput, Output = HeatPumpOutput> {}

impl<T> HeatPumpModel for T where T: Process<Input = HeatPumpInput, Output = HeatPumpOutput> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_adapter_forwards_inputs_unchanged() {
        let mut doubled = ProcessFn::new("doubler", |input: &HeatPumpInput| {
            Ok(HeatPumpOutput {
                heat_production_kw: input.power_setpoint_kw * 2.0,
            })
        });
        let out = doubled.process(&HeatPumpInput {
            power_setpoint_kw: 3.0,
        });
        assert_eq!(out.expect("closure succeeds").heat_production_kw, 6.0);
        assert_eq!(doubled.process_name(), "doubler");
    }

    #[test]
    fn closure_adapter_propagates_errors() {
        let mut failing = ProcessFn::new("failing", |input: &HeatPumpInput| {
            Err::<HeatPumpOutput, _>(SimError::DegenerateSetpoint {
                setpoint_kw: input.power_setpoint_kw,
            })
        });
        let out = failing.process(&HeatPumpInput {
            power_setpoint_kw: 0.0,
        });
        assert!(matches!(out, Err(SimError::DegenerateSetpoint { .. })));
    }

    #[test]
    fn closure_adapter_can_carry_state() {
        let mut calls = 0_u32;
        let mut counting = ProcessFn::new("counting", move |_: &HeatPumpInput| {
            calls += 1;
            Ok(HeatPumpOutput {
                heat_production_kw: f64::from(calls),
            })
        });
        let input = HeatPumpInput {
            power_setpoint_kw: 1.0,
        };
        let _ = counting.process(&input);
        let second = counting.process(&input);
        assert_eq!(second.expect("closure succeeds").heat_production_kw, 2.0);
    }

    #[test]
    fn smart_consumer_voltage_lookup() {
        let mut voltages = BTreeMap::new();
        voltages.insert("c1".to_string(), 0.99);
        voltages.insert(SMART_CONSUMER.to_string(), 0.97);
        let out = GridOutput { voltages };
        assert_eq!(out.smart_consumer_voltage(), Some(0.97));
    }
}
