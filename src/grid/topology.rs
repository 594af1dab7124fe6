use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::SimError;

/// Node id of the slack (reference) node.
pub const SLACK_NODE: usize = 1;

/// One distribution line between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Line {
    pub from: usize,
    pub to: usize,
    /// Series resistance (Ω).
    pub r_ohm: f64,
    /// Series reactance (Ω).
    pub x_ohm: f64,
    /// Thermal current limit (A).
    pub i_max_a: f64,
}

/// Line list of a radial feeder rooted at [`SLACK_NODE`].
///
/// Nodes are numbered from 1; the consumer in load-table column `k` is
/// attached to node `k + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    lines: Vec<Line>,
}

/// Parent link of a node on the path towards the slack node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Upstream {
    pub parent: usize,
    pub line: usize,
}

impl Topology {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Loads the line list from a CSV file with header `from,to,r_ohm,x_ohm,i_max_a`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingDataset` if the file does not exist, or a CSV
    /// error naming the path when a row cannot be decoded.
    pub fn from_csv_path(path: &Path) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SimError::MissingDataset {
                path: path.to_path_buf(),
            },
            _ => SimError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_reader(file, path)
    }

    /// Parses the line list from any CSV reader.
    ///
    /// # Errors
    ///
    /// Returns a CSV error naming `origin` when a row cannot be decoded.
    pub fn from_reader(reader: impl Read, origin: &Path) -> Result<Self, SimError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let lines = rdr
            .deserialize()
            .collect::<Result<Vec<Line>, csv::Error>>()
            .map_err(|source| SimError::Csv {
                path: origin.to_path_buf(),
                source,
            })?;
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Highest node id referenced by any line (at least the slack node).
    pub fn node_count(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.from.max(l.to))
            .max()
            .unwrap_or(SLACK_NODE)
            .max(SLACK_NODE)
    }

    /// Breadth-first walk from the slack node.
    ///
    /// Returns the visit order and, per node id, the upstream link. Nodes not
    /// reachable from the slack node have no entry in the order.
    pub(crate) fn walk_from_slack(&self) -> (Vec<usize>, Vec<Option<Upstream>>) {
        let n = self.node_count();
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n + 1];
        for (i, line) in self.lines.iter().enumerate() {
            adjacency[line.from].push((line.to, i));
            adjacency[line.to].push((line.from, i));
        }

        let mut upstream = vec![None; n + 1];
        let mut visited = vec![false; n + 1];
        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::from([SLACK_NODE]);
        visited[SLACK_NODE] = true;
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &(next, line) in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    upstream[next] = Some(Upstream { parent: node, line });
                    queue.push_back(next);
                }
            }
        }
        (order, upstream)
    }
}
