//! TOML-based scenario configuration.
//!
//! A scenario file is parsed into an all-optional raw structure and then
//! resolved once into the typed [`ScenarioConfig`]. Resolution reports every
//! missing key and violated constraint together, each naming the file and the
//! dotted key.

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use serde::Deserialize;

use crate::devices::occupancy::{OccupancySchedule, OccupancyWindows};
use crate::devices::room::{AmbientProfile, Room, RoomParams};
use crate::devices::{EvCharger, HeatPump};
use crate::sim::controller::{ComfortBand, ControllerSettings, EvBoost};
use crate::sim::types::SimulationConfig;

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Fully resolved scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub simulation: SimulationConfig,
    pub data: DataConfig,
    pub grid: GridConfig,
    pub heat_pump: HeatPumpConfig,
    pub room: RoomConfig,
    pub ev: EvConfig,
    pub occupancy: OccupancyWindows,
    pub controller: ControllerSettings,
}

/// Dataset and topology references, resolved against the scenario directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    /// Observed load table (CSV).
    pub observed_loads: PathBuf,
    /// Forecast load table; derived from the observed table when absent.
    pub forecast_loads: Option<PathBuf>,
    /// Line list (CSV).
    pub topology: PathBuf,
    /// Load-table column driven by the controller.
    pub flexible_consumer: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Nominal line-to-neutral voltage (V).
    pub rated_voltage_v: f64,
    /// Power factor of every load (0, 1].
    pub power_factor: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rated_voltage_v: 230.0,
            power_factor: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPumpConfig {
    /// Heat delivered per kW of setpoint.
    pub heat_per_kw: f64,
}

/// Room model parameters. Capacitance is in kWh/K and resistance in K/kW, so
/// the integration step is the simulation step expressed in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomConfig {
    pub thermal_capacitance: f64,
    pub thermal_resistance: f64,
    /// Constant outside temperature, or the daily mean when a diurnal
    /// amplitude is set (°C).
    pub outside_temperature_c: f64,
    pub diurnal_amplitude_c: Option<f64>,
    /// Hour of the warmest outside temperature.
    pub diurnal_peak_hour: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvConfig {
    pub power_cap_kw: f64,
    pub charge_step_kw: f64,
}

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Scenario file the problem was found in, if loaded from disk.
    pub file: Option<PathBuf>,
    /// Dotted field path (e.g., `"controller.voltage_min"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "config error in {}: {}: {}",
                file.display(),
                self.field,
                self.message
            ),
            None => write!(f, "config error: {}: {}", self.field, self.message),
        }
    }
}

/// Every problem found while loading one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    /// `true` if a problem was reported for `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawScenario {
    simulation: RawSimulation,
    data: RawData,
    grid: RawGrid,
    heat_pump: RawHeatPump,
    room: RawRoom,
    ev: RawEv,
    occupancy: RawOccupancy,
    controller: RawController,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSimulation {
    label: Option<String>,
    start: Option<String>,
    end: Option<String>,
    step_minutes: Option<i64>,
    seed: Option<u64>,
    initial_power_setpoint_kw: Option<f64>,
    initial_room_temperature_c: Option<f64>,
    initial_ev_power_kw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawData {
    observed_loads: Option<PathBuf>,
    forecast_loads: Option<PathBuf>,
    topology: Option<PathBuf>,
    flexible_consumer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawGrid {
    rated_voltage_v: Option<f64>,
    power_factor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawHeatPump {
    heat_per_kw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRoom {
    thermal_capacitance: Option<f64>,
    thermal_resistance: Option<f64>,
    outside_temperature_c: Option<f64>,
    diurnal_amplitude_c: Option<f64>,
    diurnal_peak_hour: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawEv {
    power_cap_kw: Option<f64>,
    charge_step_kw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawOccupancy {
    /// `[start, end)` minutes after midnight.
    leave_window: Option<[u32; 2]>,
    return_window: Option<[u32; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawController {
    voltage_min: Option<f64>,
    voltage_max: Option<f64>,
    temperature_min: Option<f64>,
    temperature_max: Option<f64>,
    power_step_voltage: Option<f64>,
    power_step_temperature: Option<f64>,
    away: Option<RawBand>,
    ev_boost: Option<RawEvBoost>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawBand {
    temperature_min: Option<f64>,
    temperature_max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawEvBoost {
    step_kw: Option<f64>,
    below_kw: Option<f64>,
}

/// Collects problems while turning raw sections into typed ones.
struct Resolver<'a> {
    file: Option<&'a Path>,
    errors: Vec<ConfigError>,
}

impl<'a> Resolver<'a> {
    fn new(file: Option<&'a Path>) -> Self {
        Self {
            file,
            errors: Vec::new(),
        }
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ConfigError {
            file: self.file.map(Path::to_path_buf),
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required<T>(&mut self, value: Option<T>, field: &str) -> Option<T> {
        if value.is_none() {
            self.error(field, "missing required key");
        }
        value
    }

    /// Checks a required number against `ok`, reporting `constraint` on failure.
    fn number(
        &mut self,
        value: Option<f64>,
        field: &str,
        constraint: &str,
        ok: impl Fn(f64) -> bool,
    ) -> Option<f64> {
        let v = self.required(value, field)?;
        if !v.is_finite() || !ok(v) {
            self.error(field, format!("must be {constraint}, got {v}"));
            return None;
        }
        Some(v)
    }

    fn timestamp(&mut self, value: Option<String>, field: &str) -> Option<NaiveDateTime> {
        let raw = self.required(value, field)?;
        let parsed = TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok());
        if parsed.is_none() {
            self.error(
                field,
                format!("expected a timestamp like 2024-01-01T00:00:00, got \"{raw}\""),
            );
        }
        parsed
    }

    fn path(&mut self, value: Option<PathBuf>, field: &str, base: &Path) -> Option<PathBuf> {
        self.required(value, field).map(|p| resolve_path(base, p))
    }

    fn window(&mut self, value: Option<[u32; 2]>, default: Range<u32>, field: &str) -> Range<u32> {
        let Some([start, end]) = value else {
            return default;
        };
        if start >= end || end > MINUTES_PER_DAY {
            self.error(
                field,
                format!("must be [start, end) with start < end <= {MINUTES_PER_DAY}, got [{start}, {end}]"),
            );
            return default;
        }
        start..end
    }

    fn simulation(&mut self, raw: RawSimulation) -> Option<SimulationConfig> {
        let label = self.required(raw.label, "simulation.label");
        if label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            self.error("simulation.label", "must not be empty");
        }
        let seed = self.required(raw.seed, "simulation.seed");
        let start = self.timestamp(raw.start, "simulation.start");
        let end = self.timestamp(raw.end, "simulation.end");
        let step_minutes = self.required(raw.step_minutes, "simulation.step_minutes");
        let initial_power = self.number(
            raw.initial_power_setpoint_kw,
            "simulation.initial_power_setpoint_kw",
            "finite",
            |_| true,
        );
        let initial_temp = self.number(
            raw.initial_room_temperature_c,
            "simulation.initial_room_temperature_c",
            "finite",
            |_| true,
        );
        let initial_ev = self.number(
            raw.initial_ev_power_kw.or(Some(0.0)),
            "simulation.initial_ev_power_kw",
            ">= 0",
            |v| v >= 0.0,
        );

        let step = match step_minutes {
            Some(m) if m > 0 => {
                let step = TimeDelta::try_minutes(m);
                if step.is_none() {
                    self.error("simulation.step_minutes", format!("out of range, got {m}"));
                }
                step
            }
            Some(m) => {
                self.error("simulation.step_minutes", format!("must be > 0, got {m}"));
                None
            }
            None => None,
        };
        if let (Some(start), Some(end), Some(step)) = (start, end, step) {
            if end - start < step {
                self.error(
                    "simulation.end",
                    "must be at least one step after simulation.start",
                );
            }
        }

        Some(SimulationConfig {
            label: label?,
            start: start?,
            end: end?,
            step: step?,
            seed: seed?,
            initial_power_setpoint_kw: initial_power?,
            initial_room_temperature_c: initial_temp?,
            initial_ev_power_kw: initial_ev?,
        })
    }

    fn data(&mut self, raw: RawData, base: &Path) -> Option<DataConfig> {
        let observed_loads = self.path(raw.observed_loads, "data.observed_loads", base);
        let topology = self.path(raw.topology, "data.topology", base);
        let flexible_consumer = self.required(raw.flexible_consumer, "data.flexible_consumer");
        Some(DataConfig {
            observed_loads: observed_loads?,
            forecast_loads: raw.forecast_loads.map(|p| resolve_path(base, p)),
            topology: topology?,
            flexible_consumer: flexible_consumer?,
        })
    }

    fn grid(&mut self, raw: RawGrid) -> Option<GridConfig> {
        let defaults = GridConfig::default();
        let rated_voltage_v = self.number(
            raw.rated_voltage_v.or(Some(defaults.rated_voltage_v)),
            "grid.rated_voltage_v",
            "> 0",
            |v| v > 0.0,
        );
        let power_factor = self.number(
            raw.power_factor.or(Some(defaults.power_factor)),
            "grid.power_factor",
            "in (0, 1]",
            |v| v > 0.0 && v <= 1.0,
        );
        Some(GridConfig {
            rated_voltage_v: rated_voltage_v?,
            power_factor: power_factor?,
        })
    }

    fn heat_pump(&mut self, raw: RawHeatPump) -> Option<HeatPumpConfig> {
        let heat_per_kw = self.number(raw.heat_per_kw, "heat_pump.heat_per_kw", ">= 0", |v| {
            v >= 0.0
        });
        Some(HeatPumpConfig {
            heat_per_kw: heat_per_kw?,
        })
    }

    fn room(&mut self, raw: RawRoom) -> Option<RoomConfig> {
        let capacitance = self.number(
            raw.thermal_capacitance,
            "room.thermal_capacitance",
            "> 0",
            |v| v > 0.0,
        );
        let resistance = self.number(
            raw.thermal_resistance,
            "room.thermal_resistance",
            "> 0",
            |v| v > 0.0,
        );
        let outside = self.number(
            raw.outside_temperature_c,
            "room.outside_temperature_c",
            "finite",
            |_| true,
        );
        let peak_hour = self.number(
            raw.diurnal_peak_hour.or(Some(15.0)),
            "room.diurnal_peak_hour",
            "in [0, 24)",
            |v| (0.0..24.0).contains(&v),
        );
        if raw.diurnal_amplitude_c.is_some_and(|a| !a.is_finite() || a < 0.0) {
            self.error("room.diurnal_amplitude_c", "must be >= 0");
        }
        Some(RoomConfig {
            thermal_capacitance: capacitance?,
            thermal_resistance: resistance?,
            outside_temperature_c: outside?,
            diurnal_amplitude_c: raw.diurnal_amplitude_c,
            diurnal_peak_hour: peak_hour?,
        })
    }

    fn ev(&mut self, raw: RawEv) -> Option<EvConfig> {
        let cap = self.number(raw.power_cap_kw, "ev.power_cap_kw", ">= 0", |v| v >= 0.0);
        let step = self.number(raw.charge_step_kw, "ev.charge_step_kw", "> 0", |v| v > 0.0);
        Some(EvConfig {
            power_cap_kw: cap?,
            charge_step_kw: step?,
        })
    }

    fn occupancy(&mut self, raw: RawOccupancy) -> OccupancyWindows {
        let defaults = OccupancyWindows::default();
        let reported = self.errors.len();
        let windows = OccupancyWindows {
            leave_minutes: self.window(
                raw.leave_window,
                defaults.leave_minutes,
                "occupancy.leave_window",
            ),
            return_minutes: self.window(
                raw.return_window,
                defaults.return_minutes,
                "occupancy.return_window",
            ),
        };
        // An earliest return before the latest leave can yield empty away intervals.
        if self.errors.len() == reported
            && windows.return_minutes.start < windows.leave_minutes.end
        {
            self.error(
                "occupancy.return_window",
                format!(
                    "must start at or after the end of occupancy.leave_window ({}), got {}",
                    windows.leave_minutes.end, windows.return_minutes.start
                ),
            );
        }
        windows
    }

    fn controller(&mut self, raw: RawController) -> Option<ControllerSettings> {
        let any = |_: f64| true;
        let voltage_min = self.number(raw.voltage_min, "controller.voltage_min", "finite", any);
        let voltage_max = self.number(raw.voltage_max, "controller.voltage_max", "finite", any);
        let temperature_min =
            self.number(raw.temperature_min, "controller.temperature_min", "finite", any);
        let temperature_max =
            self.number(raw.temperature_max, "controller.temperature_max", "finite", any);
        let power_step_voltage = self.number(
            raw.power_step_voltage,
            "controller.power_step_voltage",
            ">= 0",
            |v| v >= 0.0,
        );
        let power_step_temperature = self.number(
            raw.power_step_temperature,
            "controller.power_step_temperature",
            ">= 0",
            |v| v >= 0.0,
        );

        if let (Some(lo), Some(hi)) = (voltage_min, voltage_max) {
            if lo > hi {
                self.error("controller.voltage_min", "must be <= controller.voltage_max");
            }
        }
        if let (Some(lo), Some(hi)) = (temperature_min, temperature_max) {
            if lo > hi {
                self.error(
                    "controller.temperature_min",
                    "must be <= controller.temperature_max",
                );
            }
        }

        let away_band = raw.away.and_then(|band| {
            let lo = self.number(
                band.temperature_min,
                "controller.away.temperature_min",
                "finite",
                any,
            );
            let hi = self.number(
                band.temperature_max,
                "controller.away.temperature_max",
                "finite",
                any,
            );
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo > hi {
                    self.error(
                        "controller.away.temperature_min",
                        "must be <= controller.away.temperature_max",
                    );
                }
            }
            Some(ComfortBand {
                temperature_min: lo?,
                temperature_max: hi?,
            })
        });

        let ev_boost = raw.ev_boost.and_then(|boost| {
            let step_kw = self.number(boost.step_kw, "controller.ev_boost.step_kw", ">= 0", |v| {
                v >= 0.0
            });
            let below_kw =
                self.number(boost.below_kw, "controller.ev_boost.below_kw", "finite", any);
            Some(EvBoost {
                step_kw: step_kw?,
                below_kw: below_kw?,
            })
        });

        Some(ControllerSettings {
            voltage_min: voltage_min?,
            voltage_max: voltage_max?,
            temperature_min: temperature_min?,
            temperature_max: temperature_max?,
            power_step_voltage: power_step_voltage?,
            power_step_temperature: power_step_temperature?,
            away_band,
            ev_boost,
        })
    }
}

fn resolve_path(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

impl ScenarioConfig {
    /// Parses and resolves a scenario file. Relative data paths are taken
    /// relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigErrors` if the file cannot be read, the TOML is invalid,
    /// or any key is missing or out of range.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigErrors> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigErrors(vec![ConfigError {
                file: Some(path.to_path_buf()),
                field: "scenario".to_string(),
                message: format!("cannot read file: {e}"),
            }])
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::resolve(&content, Some(path), base)
    }

    /// Parses and resolves a scenario from a TOML string. Relative data paths
    /// are kept as written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigErrors` if the TOML is invalid or any key is missing or
    /// out of range.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigErrors> {
        Self::resolve(s, None, Path::new(""))
    }

    fn resolve(content: &str, file: Option<&Path>, base: &Path) -> Result<Self, ConfigErrors> {
        let raw: RawScenario = toml::from_str(content).map_err(|e| {
            ConfigErrors(vec![ConfigError {
                file: file.map(Path::to_path_buf),
                field: "toml".to_string(),
                message: e.to_string(),
            }])
        })?;

        let mut r = Resolver::new(file);
        let simulation = r.simulation(raw.simulation);
        let data = r.data(raw.data, base);
        let grid = r.grid(raw.grid);
        let heat_pump = r.heat_pump(raw.heat_pump);
        let room = r.room(raw.room);
        let ev = r.ev(raw.ev);
        let occupancy = r.occupancy(raw.occupancy);
        let controller = r.controller(raw.controller);

        if let (Some(sim), Some(ev)) = (&simulation, &ev) {
            if sim.initial_ev_power_kw > ev.power_cap_kw {
                r.error(
                    "simulation.initial_ev_power_kw",
                    format!(
                        "must be <= ev.power_cap_kw ({}), got {}",
                        ev.power_cap_kw, sim.initial_ev_power_kw
                    ),
                );
            }
        }

        match (simulation, data, grid, heat_pump, room, ev, controller) {
            (
                Some(simulation),
                Some(data),
                Some(grid),
                Some(heat_pump),
                Some(room),
                Some(ev),
                Some(controller),
            ) if r.errors.is_empty() => Ok(Self {
                simulation,
                data,
                grid,
                heat_pump,
                room,
                ev,
                occupancy,
                controller,
            }),
            _ => Err(ConfigErrors(r.errors)),
        }
    }

    /// Room model parameters with the step expressed in hours.
    pub fn room_params(&self) -> RoomParams {
        let r = &self.room;
        let ambient = match r.diurnal_amplitude_c {
            Some(amplitude_c) if amplitude_c > 0.0 => AmbientProfile::Diurnal {
                mean_c: r.outside_temperature_c,
                amplitude_c,
                peak_hour: r.diurnal_peak_hour,
            },
            _ => AmbientProfile::Constant(r.outside_temperature_c),
        };
        RoomParams {
            thermal_capacitance: r.thermal_capacitance,
            thermal_resistance: r.thermal_resistance,
            dt: self.simulation.dt_hours(),
            ambient,
        }
    }

    pub fn room_model(&self) -> Room {
        Room::new(self.room_params(), self.simulation.initial_room_temperature_c)
    }

    pub fn heat_pump_model(&self) -> HeatPump {
        HeatPump::new(self.heat_pump.heat_per_kw)
    }

    pub fn ev_charger(&self) -> EvCharger {
        EvCharger::new(self.ev.power_cap_kw, self.ev.charge_step_kw)
    }

    /// Occupancy schedule drawn from the configured seed.
    pub fn occupancy_schedule(&self) -> OccupancySchedule {
        OccupancySchedule::seeded(
            &self.simulation.clock(),
            &self.occupancy,
            self.simulation.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[simulation]
label = "winter_week"
start = "2024-01-01T00:00:00"
end = "2024-01-03T00:00:00"
step_minutes = 15
seed = 7
initial_power_setpoint_kw = 6.0
initial_room_temperature_c = 19.5

[data]
observed_loads = "data/loads.csv"
topology = "/abs/topology.csv"
flexible_consumer = "hp"

[heat_pump]
heat_per_kw = 0.5

[room]
thermal_capacitance = 3.0
thermal_resistance = 5.0
outside_temperature_c = 4.0

[ev]
power_cap_kw = 25.0
charge_step_kw = 0.5

[controller]
voltage_min = 0.95
voltage_max = 1.05
temperature_min = 19.0
temperature_max = 22.0
power_step_voltage = 2.0
power_step_temperature = 0.5
"#;

    #[test]
    fn full_scenario_resolves() {
        let cfg = ScenarioConfig::from_toml_str(FULL).expect("valid TOML should resolve");
        assert_eq!(cfg.simulation.label, "winter_week");
        assert_eq!(cfg.simulation.total_steps(), 192);
        assert_eq!(cfg.simulation.initial_ev_power_kw, 0.0);
        assert_eq!(cfg.grid, GridConfig::default());
        assert_eq!(cfg.occupancy, OccupancyWindows::default());
        assert_eq!(cfg.controller.away_band, None);
        assert_eq!(cfg.room_params().dt, 0.25);
        assert_eq!(cfg.room_params().ambient, AmbientProfile::Constant(4.0));
    }

    #[test]
    fn optional_controller_tables() {
        let toml = format!(
            "{FULL}\n[controller.away]\ntemperature_min = 13.0\ntemperature_max = 20.0\n\
             [controller.ev_boost]\nstep_kw = 0.5\nbelow_kw = 25.0\n"
        );
        let cfg = ScenarioConfig::from_toml_str(&toml).expect("optional tables should resolve");
        let band = cfg.controller.away_band.expect("away band");
        assert_eq!(band.temperature_min, 13.0);
        let boost = cfg.controller.ev_boost.expect("ev boost");
        assert_eq!(boost.below_kw, 25.0);
    }

    #[test]
    fn reports_every_missing_key() {
        let toml = FULL
            .replace("voltage_min = 0.95\n", "")
            .replace("thermal_resistance = 5.0\n", "");
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("missing keys must fail");
        };
        assert!(errors.mentions("controller.voltage_min"));
        assert!(errors.mentions("room.thermal_resistance"));
        assert_eq!(errors.0.len(), 2);
    }

    #[test]
    fn empty_file_names_required_sections() {
        let Err(errors) = ScenarioConfig::from_toml_str("") else {
            panic!("empty scenario must fail");
        };
        for field in [
            "simulation.start",
            "data.observed_loads",
            "heat_pump.heat_per_kw",
            "ev.power_cap_kw",
            "controller.power_step_temperature",
        ] {
            assert!(errors.mentions(field), "{field} not reported: {errors}");
        }
    }

    #[test]
    fn label_and_seed_are_required() {
        let toml = FULL
            .replace("label = \"winter_week\"\n", "")
            .replace("seed = 7\n", "");
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("scenario without label or seed must fail");
        };
        assert!(errors.mentions("simulation.label"), "{errors}");
        assert!(errors.mentions("simulation.seed"), "{errors}");
    }

    #[test]
    fn blank_label_rejected() {
        let toml = FULL.replace("label = \"winter_week\"", "label = \"  \"");
        let err = ScenarioConfig::from_toml_str(&toml);
        assert!(err.is_err_and(|e| e.mentions("simulation.label")));
    }

    #[test]
    fn oversized_step_is_an_error() {
        let toml = FULL.replace("step_minutes = 15", "step_minutes = 9223372036854775807");
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("out-of-range step must fail");
        };
        assert!(errors.mentions("simulation.step_minutes"), "{errors}");
    }

    #[test]
    fn return_window_must_follow_leave_window() {
        let toml = format!(
            "{FULL}\n[occupancy]\nleave_window = [1000, 1010]\nreturn_window = [300, 360]\n"
        );
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("swapped windows must fail");
        };
        assert!(errors.mentions("occupancy.return_window"), "{errors}");
        assert!(!errors.mentions("occupancy.leave_window"));

        let overlapping = format!(
            "{FULL}\n[occupancy]\nleave_window = [300, 600]\nreturn_window = [500, 700]\n"
        );
        let err = ScenarioConfig::from_toml_str(&overlapping);
        assert!(err.is_err_and(|e| e.mentions("occupancy.return_window")));
    }

    #[test]
    fn custom_windows_resolve() {
        let toml = format!(
            "{FULL}\n[occupancy]\nleave_window = [420, 510]\nreturn_window = [990, 1110]\n"
        );
        let cfg = ScenarioConfig::from_toml_str(&toml).expect("ordered windows should resolve");
        assert_eq!(cfg.occupancy.leave_minutes, 420..510);
        assert_eq!(cfg.occupancy.return_minutes, 990..1110);
    }

    #[test]
    fn initial_ev_power_bounded_by_cap() {
        let toml = FULL.replace(
            "initial_room_temperature_c = 19.5",
            "initial_room_temperature_c = 19.5\ninitial_ev_power_kw = 50.0",
        );
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("initial EV power above the cap must fail");
        };
        assert!(errors.mentions("simulation.initial_ev_power_kw"), "{errors}");

        let at_cap = FULL.replace(
            "initial_room_temperature_c = 19.5",
            "initial_room_temperature_c = 19.5\ninitial_ev_power_kw = 25.0",
        );
        let cfg = ScenarioConfig::from_toml_str(&at_cap).expect("initial EV power at the cap");
        assert_eq!(cfg.simulation.initial_ev_power_kw, 25.0);
    }

    #[test]
    fn unknown_field_rejected() {
        let toml = FULL.replace("[ev]\n", "[ev]\nbogus_field = true\n");
        let err = ScenarioConfig::from_toml_str(&toml);
        assert!(err.is_err_and(|e| e.mentions("toml")));
    }

    #[test]
    fn constraints_checked() {
        let toml = FULL
            .replace("voltage_max = 1.05", "voltage_max = 0.9")
            .replace("charge_step_kw = 0.5", "charge_step_kw = 0.0")
            .replace("step_minutes = 15", "step_minutes = 0");
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("constraint violations must fail");
        };
        assert!(errors.mentions("controller.voltage_min"));
        assert!(errors.mentions("ev.charge_step_kw"));
        assert!(errors.mentions("simulation.step_minutes"));
    }

    #[test]
    fn bad_timestamp_and_window() {
        let toml = format!(
            "{}\n[occupancy]\nleave_window = [400, 300]\n",
            FULL.replace("2024-01-03T00:00:00", "tomorrow")
        );
        let Err(errors) = ScenarioConfig::from_toml_str(&toml) else {
            panic!("invalid values must fail");
        };
        assert!(errors.mentions("simulation.end"));
        assert!(errors.mentions("occupancy.leave_window"));
    }

    #[test]
    fn errors_name_the_file() {
        let dir = std::env::temp_dir().join("heatgrid_cosim_config_test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("broken.toml");
        let _ = fs::write(&path, "[simulation]\nseed = 1\n");
        let Err(errors) = ScenarioConfig::from_toml_file(&path) else {
            panic!("incomplete file must fail");
        };
        let msg = errors.to_string();
        assert!(msg.contains("broken.toml"), "{msg}");
        assert!(msg.contains("simulation.start"), "{msg}");
    }

    #[test]
    fn data_paths_resolve_against_scenario_dir() {
        let dir = std::env::temp_dir().join("heatgrid_cosim_config_paths");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("week.toml");
        let _ = fs::write(&path, FULL);
        let cfg = ScenarioConfig::from_toml_file(&path).expect("scenario file should resolve");
        assert_eq!(cfg.data.observed_loads, dir.join("data/loads.csv"));
        assert_eq!(cfg.data.topology, PathBuf::from("/abs/topology.csv"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ScenarioConfig::from_toml_file(Path::new("/nonexistent/scenario.toml"));
        assert!(err.is_err_and(|e| e.mentions("scenario")));
    }

    #[test]
    fn diurnal_profile_when_amplitude_set() {
        let toml = FULL.replace(
            "outside_temperature_c = 4.0",
            "outside_temperature_c = 4.0\ndiurnal_amplitude_c = 3.0",
        );
        let cfg = ScenarioConfig::from_toml_str(&toml).expect("diurnal room should resolve");
        assert!(matches!(
            cfg.room_params().ambient,
            AmbientProfile::Diurnal { amplitude_c, .. } if amplitude_c == 3.0
        ));
    }
}
