use std::env;
use std::path::PathBuf;

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub scenario: PathBuf,
    pub seed: Option<u64>,
    /// Directory receiving one result CSV per run.
    pub telemetry_out: Option<PathBuf>,
    /// JSON file receiving the KPI and comparison summary.
    pub summary_out: Option<PathBuf>,
    /// Skip the forecast run and the comparison.
    pub observed_only: bool,
}

/// Outcome of argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliOptions),
    Help,
}

pub fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

pub fn parse_args_from(args: &[String]) -> Result<Command, String> {
    let mut i = 0usize;
    let mut scenario = None;
    let mut seed = None;
    let mut telemetry_out = None;
    let mut summary_out = None;
    let mut observed_only = false;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --scenario (expected a TOML file path)",
                )?;
                if scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                if seed.replace(value).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a directory)",
                )?;
                if telemetry_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--telemetry-out provided more than once".to_string());
                }
            }
            "--summary-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --summary-out (expected a JSON file path)",
                )?;
                if summary_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--summary-out provided more than once".to_string());
                }
            }
            "--observed-only" => observed_only = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let scenario = scenario.ok_or_else(|| "--scenario is required".to_string())?;
    Ok(Command::Run(CliOptions {
        scenario,
        seed,
        telemetry_out,
        summary_out,
        observed_only,
    }))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("heatgrid-cosim: heat pump, room, and EV co-simulation on a radial feeder");
    eprintln!();
    eprintln!("Usage: heatgrid-cosim --scenario <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Scenario TOML file");
    eprintln!("  --seed <u64>             Override the occupancy seed");
    eprintln!("  --telemetry-out <dir>    Write per-step results as CSV into <dir>");
    eprintln!("  --summary-out <path>     Write KPIs and the run comparison as JSON");
    eprintln!("  --observed-only          Skip the forecast run and comparison");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}
