//! Co-simulation manager that steps the grid, heat pump, room, EV, and controller.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::devices::occupancy::{Occupancy, OccupancySchedule};
use crate::devices::types::{
    EvInput, GridAdapter, GridInput, HeatPumpInput, HeatPumpModel, Process, RoomInput,
    SMART_CONSUMER,
};
use crate::devices::{EvCharger, Room};
use crate::error::SimError;

use super::clock::Clock;
use super::controller::{Controller, ControllerSettings};
use super::results::{Comparison, ResultRecorder, ResultSeries, compare};
use super::types::{SimulationConfig, StepRecord, SystemState};

/// Owns the clock, every model, and the live [`SystemState`].
///
/// Generic over the grid adapter, heat pump model, and controller for static
/// dispatch. The room, EV charger, and occupancy schedule are concrete since
/// their behavior is fixed.
///
/// Each step runs, in order:
///
/// 1. grid adapter with the setpoint decided in the previous step,
/// 2. heat pump with the same setpoint,
/// 3. room with the heat production,
/// 4. EV charger with the previous EV power and this step's occupancy,
/// 5. controller on the assembled state, yielding the next setpoint,
/// 6. recording of everything observed in the step.
pub struct Manager<G: GridAdapter, H: HeatPumpModel, C: Controller> {
    config: SimulationConfig,
    settings: ControllerSettings,
    grid: G,
    heat_pump: H,
    room: Room,
    ev: EvCharger,
    occupancy: OccupancySchedule,
    controller: C,
    clock: Clock,
    state: SystemState,
    baseline: Option<ResultSeries>,
}

impl<G: GridAdapter, H: HeatPumpModel, C: Controller> Manager<G, H, C> {
    /// Creates a manager positioned before the first step.
    ///
    /// The room is reset to the configured initial temperature. Steps beyond
    /// the end of `occupancy` are treated as home.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        config: SimulationConfig,
        settings: ControllerSettings,
        grid: G,
        heat_pump: H,
        mut room: Room,
        ev: EvCharger,
        occupancy: OccupancySchedule,
        controller: C,
    ) -> Self {
        room.set_temperature_c(config.initial_room_temperature_c);
        let clock = config.clock();
        let state = SystemState::initial(&config);
        if occupancy.len() < clock.total_steps() {
            warn!(
                schedule_steps = occupancy.len(),
                run_steps = clock.total_steps(),
                "occupancy schedule shorter than the run; remaining steps count as home"
            );
        }
        Self {
            config,
            settings,
            grid,
            heat_pump,
            room,
            ev,
            occupancy,
            controller,
            clock,
            state,
            baseline: None,
        }
    }

    /// Executes one step at `index`/`timestamp` and returns what it observed.
    ///
    /// # Errors
    ///
    /// Propagates any model failure. A grid output without the flexible
    /// consumer is reported as `SimError::UnknownConsumer`.
    pub fn step(&mut self, index: usize, timestamp: NaiveDateTime) -> Result<StepRecord, SimError> {
        let applied_kw = self.state.power_setpoint_kw;

        let grid = self.grid.process(&GridInput {
            timestamp,
            flexible_setpoint_kw: applied_kw,
        })?;
        let voltage = grid
            .smart_consumer_voltage()
            .ok_or_else(|| SimError::UnknownConsumer(SMART_CONSUMER.to_string()))?;

        let heat = self.heat_pump.process(&HeatPumpInput {
            power_setpoint_kw: applied_kw,
        })?;

        let room = self.room.process(&RoomInput {
            heat_input_kw: heat.heat_production_kw,
            timestamp,
        })?;

        let occupancy = self.occupancy.status_at(index).unwrap_or(Occupancy::Home);
        let ev = self.ev.process(&EvInput {
            previous_power_kw: self.state.ev_power_kw,
            occupancy,
        })?;

        self.state = SystemState {
            power_setpoint_kw: applied_kw,
            voltage,
            room_temperature_c: room.temperature_c,
            ev_power_kw: ev.power_kw,
            occupancy,
            heat_production_kw: heat.heat_production_kw,
        };
        let next_kw = self.controller.decide(&self.state, &self.settings);
        self.state.power_setpoint_kw = next_kw;
        debug!(
            index,
            %timestamp,
            voltage,
            room_temperature_c = room.temperature_c,
            ev_power_kw = ev.power_kw,
            ev_phase = ?self.ev.phase(),
            "step complete"
        );

        Ok(StepRecord {
            index,
            timestamp,
            power_setpoint_kw: applied_kw,
            next_power_setpoint_kw: next_kw,
            voltage,
            heat_production_kw: heat.heat_production_kw,
            room_temperature_c: room.temperature_c,
            ev_power_kw: ev.power_kw,
            occupancy,
        })
    }

    /// Resets to the initial state and runs every step of the horizon.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step; no partial series is returned.
    pub fn run(&mut self) -> Result<ResultSeries, SimError> {
        self.reset();
        let total = self.clock.total_steps();
        info!(
            scenario = %self.config.label,
            start = %self.config.start,
            end = %self.config.end,
            step_minutes = self.config.step.num_minutes(),
            steps = total,
            seed = self.config.seed,
            "starting co-simulation run"
        );
        if !self.room.is_numerically_stable() {
            warn!(
                dt = self.room.params().dt,
                "room step exceeds the explicit Euler stability bound 2RC"
            );
        }

        let mut recorder = ResultRecorder::with_capacity(total);
        while let Some((index, timestamp)) = self.clock.tick() {
            let record = self.step(index, timestamp)?;
            recorder.record(&record);
        }

        let series = recorder.finish();
        info!(
            scenario = %self.config.label,
            steps = series.len(),
            final_setpoint_kw = self.state.power_setpoint_kw,
            final_room_temperature_c = self.state.room_temperature_c,
            "co-simulation run finished"
        );
        Ok(series)
    }

    /// Restores the initial state so the next run replays from the start.
    ///
    /// The stored baseline is kept.
    pub fn reset(&mut self) {
        self.clock.rewind();
        self.state = SystemState::initial(&self.config);
        self.room.set_temperature_c(self.config.initial_room_temperature_c);
        self.ev.reset();
    }

    /// Retains `series` as the baseline for later comparisons, replacing any
    /// previously stored run.
    pub fn store_results(&mut self, series: ResultSeries) {
        self.baseline = Some(series);
    }

    /// Compares `candidate` against the stored baseline.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NoBaseline` if [`Manager::store_results`] was never
    /// called, or `SimError::Incomparable` if either run is empty.
    pub fn compare_results(&self, candidate: &ResultSeries) -> Result<Comparison, SimError> {
        let baseline = self.baseline.as_ref().ok_or(SimError::NoBaseline)?;
        compare(baseline, candidate)
    }

    pub fn baseline(&self) -> Option<&ResultSeries> {
        self.baseline.as_ref()
    }

    /// Current live state.
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
