//! Grid adapters mapping a load vector and the flexible setpoint to voltages.

use std::collections::BTreeMap;

use crate::devices::types::{GridInput, GridOutput, Process, SMART_CONSUMER};
use crate::error::SimError;

use super::load_table::LoadTable;
use super::topology::{Topology, Upstream};

/// Setpoints with a smaller magnitude cannot drive the inverse stand-in.
const MIN_SETPOINT_MAGNITUDE_KW: f64 = 1e-9;

/// Linearised voltage-drop stand-in for a radial low-voltage feeder.
///
/// For every line, the per-unit drop is `(r·P + x·Q) / V_rated²`, where `P`
/// and `Q` are the active and reactive power drawn downstream of the line.
/// Reactive power follows a fixed power factor. The slack node sits at 1.0 pu.
/// This only approximates a full power-flow solve.
#[derive(Debug, Clone)]
pub struct RadialFeeder {
    loads: LoadTable,
    topology: Topology,
    flexible_column: usize,
    rated_voltage_v: f64,
    reactive_ratio: f64,
    order: Vec<usize>,
    upstream: Vec<Option<Upstream>>,
}

impl RadialFeeder {
    /// Creates a feeder over `loads` and `topology`.
    ///
    /// # Errors
    ///
    /// Fails fast when the flexible consumer is not a load-table column, the
    /// topology has fewer nodes than consumers, or a consumer node cannot be
    /// reached from the slack node.
    pub fn new(
        loads: LoadTable,
        topology: Topology,
        flexible_consumer: &str,
        rated_voltage_v: f64,
        power_factor: f64,
    ) -> Result<Self, SimError> {
        let flexible_column = loads
            .consumer_index(flexible_consumer)
            .ok_or_else(|| SimError::UnknownConsumer(flexible_consumer.to_string()))?;

        let required = loads.consumers().len();
        let nodes = topology.node_count();
        if nodes < required {
            return Err(SimError::TopologyTooSmall { nodes, required });
        }

        let (order, upstream) = topology.walk_from_slack();
        if let Some(node) = (1..=required).find(|&node| !order.contains(&node)) {
            return Err(SimError::DisconnectedNode { node });
        }

        Ok(Self {
            loads,
            topology,
            flexible_column,
            rated_voltage_v,
            reactive_ratio: power_factor.acos().tan(),
            order,
            upstream,
        })
    }

    /// Per-unit voltage per node id (index 0 unused).
    fn node_voltages(&self, loads_kw: &[f64]) -> Vec<f64> {
        let n = self.upstream.len();
        let mut p_w = vec![0.0; n];
        for (column, kw) in loads_kw.iter().enumerate() {
            p_w[column + 1] += kw * 1e3;
        }

        // Accumulate downstream power, leaves first.
        for &node in self.order.iter().rev() {
            if let Some(up) = self.upstream[node] {
                p_w[up.parent] += p_w[node];
            }
        }

        let v_sq = self.rated_voltage_v * self.rated_voltage_v;
        let mut voltage = vec![1.0; n];
        for &node in &self.order {
            if let Some(up) = self.upstream[node] {
                let line = &self.topology.lines()[up.line];
                let p = p_w[node];
                let q = p * self.reactive_ratio;
                voltage[node] = voltage[up.parent] - (line.r_ohm * p + line.x_ohm * q) / v_sq;
            }
        }
        voltage
    }
}

impl Process for RadialFeeder {
    type Input = GridInput;
    type Output = GridOutput;

    fn process(&mut self, input: &GridInput) -> Result<GridOutput, SimError> {
        let loads = self.loads.loads_with_setpoint(
            input.timestamp,
            self.flexible_column,
            input.flexible_setpoint_kw,
        )?;
        let node_voltage = self.node_voltages(&loads);

        let voltages = self
            .loads
            .consumers()
            .iter()
            .enumerate()
            .map(|(column, id)| {
                let key = if column == self.flexible_column {
                    SMART_CONSUMER.to_string()
                } else {
                    id.clone()
                };
                (key, node_voltage[column + 1])
            })
            .collect();
        Ok(GridOutput { voltages })
    }

    fn process_name(&self) -> &'static str {
        "RadialFeeder"
    }
}

/// Stand-in grid whose flexible-consumer voltage is `numerator / setpoint`.
///
/// Used for controller scenarios; the relationship is undefined at a zero
/// setpoint and reported as `SimError::DegenerateSetpoint` there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseSetpointGrid {
    pub numerator: f64,
}

impl InverseSetpointGrid {
    pub fn new(numerator: f64) -> Self {
        Self { numerator }
    }

    /// Voltage for the given setpoint.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DegenerateSetpoint` when the setpoint is (nearly) zero.
    pub fn voltage(&self, setpoint_kw: f64) -> Result<f64, SimError> {
        if !setpoint_kw.is_finite() || setpoint_kw.abs() < MIN_SETPOINT_MAGNITUDE_KW {
            return Err(SimError::DegenerateSetpoint { setpoint_kw });
        }
        Ok(self.numerator / setpoint_kw)
    }
}

impl Process for InverseSetpointGrid {
    type Input = GridInput;
    type Output = GridOutput;

    fn process(&mut self, input: &GridInput) -> Result<GridOutput, SimError> {
        let v = self.voltage(input.flexible_setpoint_kw)?;
        let mut voltages = BTreeMap::new();
        voltages.insert(SMART_CONSUMER.to_string(), v);
        Ok(GridOutput { voltages })
    }

    fn process_name(&self) -> &'static str {
        "InverseSetpointGrid"
    }
}
