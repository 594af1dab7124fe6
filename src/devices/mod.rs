//! Coupled models exchanged with the manager at every step.

/// Electric vehicle charger model.
pub mod ev_charger;
pub mod heat_pump;
/// Seeded home/away schedule.
pub mod occupancy;
/// Single-node RC room model.
pub mod room;
pub mod types;

// Re-export the main types for convenience
pub use ev_charger::EvCharger;
pub use heat_pump::HeatPump;
pub use occupancy::{Occupancy, OccupancySchedule, OccupancyWindows};
pub use room::Room;
pub use types::Process;
