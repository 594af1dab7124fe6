//! Per-step result recording and run-to-run comparison.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::types::StepRecord;
use crate::error::SimError;

/// A named quantity recorded once per step.
///
/// Variants are ordered the way they appear in exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PowerSetpointKw,
    NextPowerSetpointKw,
    Voltage,
    HeatProductionKw,
    RoomTemperatureC,
    EvPowerKw,
    OccupancyStatus,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::PowerSetpointKw,
        Metric::NextPowerSetpointKw,
        Metric::Voltage,
        Metric::HeatProductionKw,
        Metric::RoomTemperatureC,
        Metric::EvPowerKw,
        Metric::OccupancyStatus,
    ];

    /// Column name used in CSV and JSON exports.
    pub fn name(self) -> &'static str {
        match self {
            Metric::PowerSetpointKw => "power_setpoint_kw",
            Metric::NextPowerSetpointKw => "next_power_setpoint_kw",
            Metric::Voltage => "voltage",
            Metric::HeatProductionKw => "heat_production_kw",
            Metric::RoomTemperatureC => "room_temperature_c",
            Metric::EvPowerKw => "ev_power_kw",
            Metric::OccupancyStatus => "occupancy_status",
        }
    }

    fn value(self, record: &StepRecord) -> f64 {
        match self {
            Metric::PowerSetpointKw => record.power_setpoint_kw,
            Metric::NextPowerSetpointKw => record.next_power_setpoint_kw,
            Metric::Voltage => record.voltage,
            Metric::HeatProductionKw => record.heat_production_kw,
            Metric::RoomTemperatureC => record.room_temperature_c,
            Metric::EvPowerKw => record.ev_power_kw,
            Metric::OccupancyStatus => f64::from(record.occupancy.code()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append-only collector filled by the manager during a run.
///
/// Call [`ResultRecorder::finish`] once the run completes to obtain the
/// read-only [`ResultSeries`].
#[derive(Debug, Clone, Default)]
pub struct ResultRecorder {
    series: ResultSeries,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(steps: usize) -> Self {
        let values = Metric::ALL
            .into_iter()
            .map(|m| (m, Vec::with_capacity(steps)))
            .collect();
        Self {
            series: ResultSeries {
                timestamps: Vec::with_capacity(steps),
                values,
            },
        }
    }

    /// Appends one step. Every metric gains exactly one value.
    pub fn record(&mut self, record: &StepRecord) {
        self.series.timestamps.push(record.timestamp);
        for metric in Metric::ALL {
            self.series
                .values
                .entry(metric)
                .or_default()
                .push(metric.value(record));
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Freezes the recorded values.
    pub fn finish(self) -> ResultSeries {
        self.series
    }
}

/// Ordered per-metric value sequences of one completed run.
///
/// All metric sequences have the same length as `timestamps`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSeries {
    timestamps: Vec<NaiveDateTime>,
    values: BTreeMap<Metric, Vec<f64>>,
}

impl ResultSeries {
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Values of one metric, in step order.
    pub fn values(&self, metric: Metric) -> &[f64] {
        self.values.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Arithmetic mean of a metric, `None` for an empty series.
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        let values = self.values(metric);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Iterates over metrics and their values in export order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &[f64])> {
        self.values.iter().map(|(m, v)| (*m, v.as_slice()))
    }
}

/// Side-by-side statistics of one metric in two runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub baseline_mean: f64,
    pub candidate_mean: f64,
    /// `candidate_mean - baseline_mean`.
    pub mean_difference: f64,
    /// Largest step-wise absolute difference; only set for aligned runs.
    pub max_abs_difference: Option<f64>,
    /// Step-wise root-mean-square difference; only set for aligned runs.
    pub rmse: Option<f64>,
}

/// Summary comparison of a candidate run against a stored baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub baseline_steps: usize,
    pub candidate_steps: usize,
    /// Both runs cover the same timestamps.
    pub aligned: bool,
    pub metrics: Vec<MetricComparison>,
}

impl Comparison {
    pub fn metric(&self, metric: Metric) -> Option<&MetricComparison> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

/// Compares `candidate` against `baseline`, metric by metric.
///
/// Means are always compared. Step-wise statistics are only reported when
/// both runs cover identical timestamps.
///
/// # Errors
///
/// Returns `SimError::Incomparable` if either run has no steps.
///
/// # Examples
///
/// ```
/// use heatgrid_cosim::sim::results::{compare, ResultSeries};
///
/// let empty = ResultSeries::default();
/// assert!(compare(&empty, &empty).is_err());
/// ```
pub fn compare(baseline: &ResultSeries, candidate: &ResultSeries) -> Result<Comparison, SimError> {
    if baseline.is_empty() {
        return Err(SimError::Incomparable("baseline run has no steps".into()));
    }
    if candidate.is_empty() {
        return Err(SimError::Incomparable("candidate run has no steps".into()));
    }
    let aligned = baseline.timestamps == candidate.timestamps;

    let mut metrics = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let (Some(baseline_mean), Some(candidate_mean)) =
            (baseline.mean(metric), candidate.mean(metric))
        else {
            continue;
        };

        let (max_abs_difference, rmse) = if aligned {
            let diffs = baseline
                .values(metric)
                .iter()
                .zip(candidate.values(metric))
                .map(|(b, c)| c - b);
            let (max, sq_sum, n) = diffs.fold((0.0_f64, 0.0_f64, 0_usize), |(max, sq, n), d| {
                (max.max(d.abs()), sq + d * d, n + 1)
            });
            (Some(max), Some((sq_sum / n.max(1) as f64).sqrt()))
        } else {
            (None, None)
        };

        metrics.push(MetricComparison {
            metric,
            baseline_mean,
            candidate_mean,
            mean_difference: candidate_mean - baseline_mean,
            max_abs_difference,
            rmse,
        });
    }

    Ok(Comparison {
        baseline_steps: baseline.len(),
        candidate_steps: candidate.len(),
        aligned,
        metrics,
    })
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Run comparison ({} vs {} steps{}) ---",
            self.baseline_steps,
            self.candidate_steps,
            if self.aligned { "" } else { ", not aligned" }
        )?;
        writeln!(
            f,
            "{:<24} {:>12} {:>12} {:>12} {:>12}",
            "metric", "baseline", "candidate", "diff", "max |diff|"
        )?;
        for (i, m) in self.metrics.iter().enumerate() {
            let max = m
                .max_abs_difference
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "-".to_string());
            write!(
                f,
                "{:<24} {:>12.4} {:>12.4} {:>12.4} {:>12}",
                m.metric.name(),
                m.baseline_mean,
                m.candidate_mean,
                m.mean_difference,
                max
            )?;
            if i + 1 < self.metrics.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
