//! heatgrid-cosim entry point: CLI wiring and scenario execution.

use std::fs;
use std::path::Path;
use std::process;

use heatgrid_cosim::cli::{self, CliOptions, Command};
use heatgrid_cosim::config::ScenarioConfig;
use heatgrid_cosim::io::export::{export_csv, export_json};
use heatgrid_cosim::reporting::print_summary;
use heatgrid_cosim::runner::{run_observed, run_scenario_pair};
use heatgrid_cosim::sim::results::ResultSeries;
use heatgrid_cosim::telemetry::init_tracing;

fn run(opts: &CliOptions) -> Result<(), String> {
    let mut scenario =
        ScenarioConfig::from_toml_file(&opts.scenario).map_err(|e| e.to_string())?;
    if let Some(seed) = opts.seed {
        scenario.simulation.seed = seed;
    }

    let outcome = if opts.observed_only {
        run_observed(&scenario)
    } else {
        run_scenario_pair(&scenario)
    }
    .map_err(|e| e.to_string())?;

    let summary = outcome.summary(&scenario);
    print_summary(&summary);

    if let Some(dir) = &opts.telemetry_out {
        fs::create_dir_all(dir)
            .map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
        write_series(&dir.join("observed.csv"), &outcome.observed)?;
        if let Some(forecast) = &outcome.forecast {
            write_series(&dir.join("forecast.csv"), forecast)?;
        }
    }

    if let Some(path) = &opts.summary_out {
        export_json(&summary, path)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        eprintln!("Summary written to {}", path.display());
    }
    Ok(())
}

fn write_series(path: &Path, series: &ResultSeries) -> Result<(), String> {
    export_csv(series, path)
        .map_err(|e| format!("failed to write CSV {}: {e}", path.display()))?;
    eprintln!("Telemetry written to {}", path.display());
    Ok(())
}

fn main() {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&opts) {
        eprintln!("{e}");
        process::exit(1);
    }
}
