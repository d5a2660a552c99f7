#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Colony simulation headlessly.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colony_core::Settings;
use colony_rendering::Scene;
use colony_system_census::CensusReport;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod driver;

use driver::Simulation;

/// Runs a seeded Colony simulation for a fixed number of ticks.
#[derive(Parser, Debug)]
#[command(name = "colony", about = "Headless artificial-life colony simulation")]
struct Args {
    /// TOML file overriding the default parameters.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed shared by the world and the spawners.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate.
    #[arg(short, long, default_value_t = 1500)]
    ticks: u64,

    /// Fixed timestep in milliseconds.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    dt_ms: u64,

    /// Log a census every N ticks.
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(1..))]
    report_every: u64,

    /// Write captured scenes to this JSON file.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Capture a scene every N ticks when exporting.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    export_every: u64,

    /// Print the final census as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Scenes recorded during a run.
#[derive(Debug, Serialize)]
struct SceneExport {
    seed: u64,
    dt_ms: u64,
    frames: Vec<Scene>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let settings = load_settings(args.config.as_deref())?;
    let mut simulation = Simulation::new(settings, args.seed, Duration::from_millis(args.dt_ms))
        .context("invalid simulation parameters")?;
    info!(seed = args.seed, ticks = args.ticks, "colony started");

    let mut frames = Vec::new();
    if args.export.is_some() {
        frames.push(simulation.capture());
    }

    for _ in 0..args.ticks {
        simulation.step();
        let tick = simulation.tick();
        if tick % args.report_every == 0 {
            log_report(&simulation.report());
        }
        if args.export.is_some() && tick % args.export_every == 0 {
            frames.push(simulation.capture());
        }
    }

    let report = simulation.report();
    log_report(&report);

    if let Some(path) = &args.export {
        let export = SceneExport {
            seed: args.seed,
            dt_ms: args.dt_ms,
            frames,
        };
        write_export(path, &export)?;
        info!(frames = export.frames.len(), path = %path.display(), "scenes exported");
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode census report")?
        );
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
}

/// Reads parameters from `path`, falling back to the defaults.
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        debug!("using default parameters");
        return Ok(Settings::default());
    };

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let settings: Settings = toml::from_str(&source)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid parameters in {}", path.display()))?;
    Ok(settings)
}

fn write_export(path: &Path, export: &SceneExport) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, export)
        .with_context(|| format!("failed to write scenes to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}

fn log_report(report: &CensusReport) {
    info!(
        tick = report.tick,
        cells = report.cell_count(),
        packets = report.packets,
        bonds = report.bonds,
        organisms = report.organisms,
        structures = report.structures,
        largest = report.largest_structure,
        energy = report.cell_energy,
        births = report.events.births,
        deaths = report.events.deaths,
        "census"
    );
}
