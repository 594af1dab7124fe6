//! Error types shared by the simulation library.

use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::ConfigErrors;

/// Failures surfaced by loading, stepping, or comparing simulation runs.
///
/// All variants are structural (bad configuration or data, misuse of the
/// comparison API). Stepping itself is deterministic and has no transient
/// failure mode.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),

    #[error("dataset file `{}` not found", path.display())]
    MissingDataset { path: PathBuf },

    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid CSV in `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed dataset `{}` at row {row}: {message}", path.display())]
    MalformedDataset {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("load table has no row for {0}")]
    MissingTimestamp(NaiveDateTime),

    #[error("consumer `{0}` is not present in the load table")]
    UnknownConsumer(String),

    #[error("topology has {nodes} nodes but the load table needs {required}")]
    TopologyTooSmall { nodes: usize, required: usize },

    #[error("topology node {node} is not connected to the slack node")]
    DisconnectedNode { node: usize },

    #[error("flexible setpoint {setpoint_kw} kW is too close to zero to derive a voltage")]
    DegenerateSetpoint { setpoint_kw: f64 },

    #[error("no baseline run has been stored; call `store_results` first")]
    NoBaseline,

    #[error("results cannot be compared: {0}")]
    Incomparable(String),
}
