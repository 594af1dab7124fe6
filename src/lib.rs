//! Co-simulation of a heat pump, an RC room, and an EV charger on a
//! low-voltage feeder, steered by a voltage-first rule-based controller.

pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod forecast;
/// Load tables, feeder topology, and grid voltage stand-ins.
pub mod grid;
pub mod io;
pub mod reporting;
pub mod runner;
/// Clock, controller, manager, results, and KPI modules.
pub mod sim;
pub mod telemetry;

pub use error::SimError;
