/// Simulation clock for timestep management.
pub mod clock;
pub mod controller;
pub mod kpi;
/// Step pipeline orchestration.
pub mod manager;
pub mod results;
pub mod types;
