//! CSV export for result series and JSON export for run summaries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::sim::results::ResultSeries;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Exports a result series to a CSV file at the given path.
///
/// Writes a `timestamp` column followed by one column per metric, in metric
/// order. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(series: &ResultSeries, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(series, buf)
}

/// Writes a result series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(series: &ResultSeries, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let columns: Vec<_> = series.iter().collect();

    // Header
    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("timestamp");
    header.extend(columns.iter().map(|(metric, _)| metric.name()));
    wtr.write_record(&header)?;

    // Data rows
    for (i, t) in series.timestamps().iter().enumerate() {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(t.format(TIMESTAMP_FORMAT).to_string());
        for (_, values) in &columns {
            row.push(values.get(i).map(|v| format!("{v:.6}")).unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports any serializable summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization, or writing fails.
pub fn export_json(summary: &impl Serialize, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut buf = io::BufWriter::new(file);
    write_json(summary, &mut buf)?;
    buf.flush()
}

/// Writes any serializable summary as pretty-printed JSON to a writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(summary: &impl Serialize, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::occupancy::Occupancy;
    use crate::sim::results::{Metric, ResultRecorder, compare};
    use crate::sim::types::StepRecord;
    use chrono::{NaiveDate, TimeDelta};

    fn make_series(steps: usize) -> ResultSeries {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        let mut rec = ResultRecorder::with_capacity(steps);
        for i in 0..steps {
            rec.record(&StepRecord {
                index: i,
                timestamp: t0 + TimeDelta::minutes(15 * i as i64),
                power_setpoint_kw: 3.0 + i as f64,
                next_power_setpoint_kw: 4.0 + i as f64,
                voltage: 0.98,
                heat_production_kw: 1.5,
                room_temperature_c: 20.25,
                ev_power_kw: 0.5,
                occupancy: Occupancy::Home,
            });
        }
        rec.finish()
    }

    fn csv_text(series: &ResultSeries) -> String {
        let mut buf = Vec::new();
        write_csv(series, &mut buf).expect("write to memory");
        String::from_utf8(buf).expect("CSV should be UTF-8")
    }

    #[test]
    fn header_lists_timestamp_then_metrics() {
        let text = csv_text(&make_series(1));
        let first_line = text.lines().next().expect("header line");
        let expected: Vec<&str> = std::iter::once("timestamp")
            .chain(Metric::ALL.iter().map(|m| m.name()))
            .collect();
        assert_eq!(first_line, expected.join(","));
    }

    #[test]
    fn row_count_matches_step_count() {
        let text = csv_text(&make_series(96));
        // 1 header + 96 data rows
        assert_eq!(text.lines().count(), 97);
    }

    #[test]
    fn deterministic_output() {
        let series = make_series(5);
        assert_eq!(csv_text(&series), csv_text(&series));
    }

    #[test]
    fn rows_are_parseable() {
        let text = csv_text(&make_series(3));
        let mut rdr = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let width = rdr.headers().expect("header row").len();
        assert_eq!(width, Metric::ALL.len() + 1);

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            assert_eq!(&rec[0][..10], "2024-01-01");
            for i in 1..rec.len() {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 3);
    }

    #[test]
    fn comparison_json_names_metrics() {
        let series = make_series(4);
        let cmp = compare(&series, &series).expect("non-empty runs compare");
        let mut buf = Vec::new();
        write_json(&cmp, &mut buf).expect("write to memory");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("valid JSON");
        assert_eq!(value["aligned"], serde_json::Value::Bool(true));
        assert_eq!(value["metrics"][0]["metric"], "power_setpoint_kw");
    }
}
