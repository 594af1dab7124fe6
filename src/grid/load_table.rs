use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::SimError;

const TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Non-flexible consumer loads (kW) indexed by timestamp and consumer id.
///
/// CSV layout: a first `time` column followed by one column per consumer.
/// Rows must be in strictly increasing time order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTable {
    consumers: Vec<String>,
    index: BTreeMap<NaiveDateTime, usize>,
    rows: Vec<Vec<f64>>,
}

impl LoadTable {
    /// Builds a table from in-memory rows.
    ///
    /// # Panics
    ///
    /// Panics if a row's width differs from the number of consumers.
    pub fn from_rows(consumers: Vec<String>, rows: Vec<(NaiveDateTime, Vec<f64>)>) -> Self {
        let mut index = BTreeMap::new();
        let mut values = Vec::with_capacity(rows.len());
        for (i, (t, row)) in rows.into_iter().enumerate() {
            assert_eq!(row.len(), consumers.len(), "row width must match consumer count");
            index.insert(t, i);
            values.push(row);
        }
        Self {
            consumers,
            index,
            rows: values,
        }
    }

    /// Loads a table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingDataset` if the file does not exist, or a
    /// CSV / malformed-dataset error naming the path and row otherwise.
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

    /// Parses a table from any CSV reader; `origin` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the header has no consumer columns, a timestamp or
    /// value cannot be parsed, or timestamps are not strictly increasing.
    pub fn from_reader(reader: impl Read, origin: &Path) -> Result<Self, SimError> {
        let malformed = |row: usize, message: String| SimError::MalformedDataset {
            path: origin.to_path_buf(),
            row,
            message,
        };
        let csv_err = |source: csv::Error| SimError::Csv {
            path: origin.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers().map_err(csv_err)?.clone();
        let consumers: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        if consumers.is_empty() {
            return Err(malformed(0, "expected a time column and at least one consumer column".into()));
        }

        let mut rows = Vec::new();
        let mut last: Option<NaiveDateTime> = None;
        for (i, record) in rdr.records().enumerate() {
            let row_no = i + 1;
            let record = record.map_err(csv_err)?;
            let raw_time = record.get(0).unwrap_or_default();
            let t = parse_timestamp(raw_time)
                .ok_or_else(|| malformed(row_no, format!("invalid timestamp \"{raw_time}\"")))?;
            if last.is_some_and(|prev| prev >= t) {
                return Err(malformed(row_no, format!("timestamp {t} is not after the previous row")));
            }
            last = Some(t);

            let values = record
                .iter()
                .skip(1)
                .zip(&consumers)
                .map(|(raw, consumer)| {
                    raw.parse::<f64>().map_err(|_| {
                        malformed(row_no, format!("invalid value \"{raw}\" for consumer `{consumer}`"))
                    })
                })
                .collect::<Result<Vec<f64>, SimError>>()?;
            if values.len() != consumers.len() {
                return Err(malformed(
                    row_no,
                    format!("expected {} values, found {}", consumers.len(), values.len()),
                ));
            }
            rows.push((t, values));
        }

        Ok(Self::from_rows(consumers, rows))
    }

    pub fn consumers(&self) -> &[String] {
        &self.consumers
    }

    /// Column index of `consumer`.
    pub fn consumer_index(&self, consumer: &str) -> Option<usize> {
        self.consumers.iter().position(|c| c == consumer)
    }

    /// Loads at timestamp `t`, one per consumer.
    pub fn row(&self, t: NaiveDateTime) -> Option<&[f64]> {
        self.index.get(&t).map(|&i| self.rows[i].as_slice())
    }

    /// Loads at `t` with the flexible consumer's column replaced by `setpoint_kw`.
    ///
    /// The table itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingTimestamp` if the table has no row for `t`.
    pub fn loads_with_setpoint(
        &self,
        t: NaiveDateTime,
        flexible_column: usize,
        setpoint_kw: f64,
    ) -> Result<Vec<f64>, SimError> {
        let mut loads = self.row(t).ok_or(SimError::MissingTimestamp(t))?.to_vec();
        if let Some(slot) = loads.get_mut(flexible_column) {
            *slot = setpoint_kw;
        }
        Ok(loads)
    }

    /// Row timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.index.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a table with the same timestamps where every row is taken from
    /// `lag` earlier, falling back to the row itself when no such row exists.
    pub fn lagged(&self, lag: TimeDelta) -> Self {
        let rows = self
            .index
            .iter()
            .map(|(&t, &i)| {
                let source = self.index.get(&(t - lag)).copied().unwrap_or(i);
                (t, self.rows[source].clone())
            })
            .collect();
        Self::from_rows(self.consumers.clone(), rows)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
