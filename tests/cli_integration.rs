use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heatgrid-cosim"))
        .args(args)
        .output()
        .expect("heatgrid-cosim process should run")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("heatgrid-cosim-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));
    let value = raw
        .split_whitespace()
        .next()
        .map(|v| v.trim_end_matches(unit))
        .unwrap_or_else(|| panic!("missing value in line `{line}`"));
    value
        .parse::<f64>()
        .unwrap_or_else(|e| panic!("failed to parse `{value}` from `{line}`: {e}"))
}

fn observed_section(stdout: &str) -> &str {
    let start = stdout.find("[observed]").expect("observed section");
    &stdout[start..]
}

#[test]
fn baseline_writes_telemetry_and_summary() {
    let dir = scratch_dir("baseline");
    let telemetry = dir.join("telemetry");
    let summary = dir.join("summary.json");

    let output = run_cli(&[
        "--scenario",
        "scenarios/baseline.toml",
        "--telemetry-out",
        telemetry.to_str().expect("utf-8 path"),
        "--summary-out",
        summary.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "baseline run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("=== Scenario baseline ==="));
    assert!(stdout.contains("[forecast]"));

    for name in ["observed.csv", "forecast.csv"] {
        let csv = fs::read_to_string(telemetry.join(name)).expect("telemetry CSV");
        let mut lines = csv.lines();
        let header = lines.next().expect("header");
        assert!(header.starts_with("timestamp,power_setpoint_kw"));
        assert_eq!(lines.count(), 192, "{name}");
    }

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary JSON"))
            .expect("summary should be valid JSON");
    assert_eq!(json["scenario"], "baseline");
    assert_eq!(json["observed"]["steps"], 192);
    assert_eq!(json["comparison"]["aligned"], true);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenarios_produce_distinct_occupancy() {
    let baseline = run_cli(&["--scenario", "scenarios/baseline.toml", "--observed-only"]);
    let away = run_cli(&["--scenario", "scenarios/persistence_away.toml", "--observed-only"]);
    assert!(baseline.status.success());
    assert!(away.status.success());

    let baseline = String::from_utf8(baseline.stdout).expect("utf-8");
    let away = String::from_utf8(away.stdout).expect("utf-8");
    assert!(!baseline.contains("[forecast]"));

    let baseline_away = parse_metric(observed_section(&baseline), "Occupant away:", "%");
    let scenario_away = parse_metric(observed_section(&away), "Occupant away:", "%");
    assert!(
        (baseline_away - scenario_away).abs() > 1.0,
        "expected away shares to differ: baseline={baseline_away:.1}, persistence_away={scenario_away:.1}"
    );
}

#[test]
fn seed_override_is_reproducible() {
    let a = run_cli(&["--scenario", "scenarios/baseline.toml", "--observed-only", "--seed", "1"]);
    let b = run_cli(&["--scenario", "scenarios/baseline.toml", "--observed-only", "--seed", "1"]);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn missing_key_exits_with_field_and_file() {
    let dir = scratch_dir("missing-key");
    let scenario = Path::new("scenarios/baseline.toml");
    let text = fs::read_to_string(scenario).expect("baseline scenario");
    let broken: String = text
        .lines()
        .filter(|line| !line.starts_with("voltage_min"))
        .map(|line| format!("{line}\n"))
        .collect();
    let path = dir.join("broken.toml");
    fs::write(&path, broken).expect("write broken scenario");

    let output = run_cli(&["--scenario", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("controller.voltage_min"), "stderr={stderr}");
    assert!(stderr.contains("broken.toml"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_flag_exits_with_usage() {
    let output = run_cli(&["--scenario", "scenarios/baseline.toml", "--bogus"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown argument: --bogus"));
    assert!(stderr.contains("Usage: heatgrid-cosim"));
}
