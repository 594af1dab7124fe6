//! Grid adapter inputs (load table, topology) and voltage stand-ins.

pub mod feeder;
/// Timestamped consumer load table.
pub mod load_table;
/// Radial line topology.
pub mod topology;

pub use feeder::{InverseSetpointGrid, RadialFeeder};
pub use load_table::LoadTable;
pub use topology::{Line, Topology};
