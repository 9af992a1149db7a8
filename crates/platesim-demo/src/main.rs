use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use platesim_core::log::TracingLogger;
use platesim_core::sim::{Simulation, format_hms};
use platesim_demo::{DemoError, PlantSource, RunOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Plating line simulation runner
#[derive(Parser)]
#[command(name = "platesim")]
#[command(about = "Simulate a plating line served by a single crane", long_about = None)]
#[command(version)]
struct Cli {
    /// Plant file (.ron, .json or .toml); the built-in silver line if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in preset to run when no config file is given
    #[arg(long, default_value = "silver_line")]
    preset: String,

    /// Steps per wall-clock second in real-time mode
    #[arg(long)]
    speed: Option<u32>,

    /// Stop once simulated time reaches this many seconds
    #[arg(long)]
    max_time: Option<u64>,

    /// Simulated seconds per step
    #[arg(long)]
    step: Option<u64>,

    /// Log every state transition
    #[arg(short, long)]
    verbose: bool,

    /// Pace the run against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Print a snapshot every N steps (0: final snapshot only)
    #[arg(long, default_value_t = 0)]
    render_every: u64,
}

fn run(cli: Cli) -> Result<(), DemoError> {
    let source = match cli.config {
        Some(path) => PlantSource::File(path),
        None => PlantSource::Preset(cli.preset),
    };
    let options = RunOptions {
        speed: cli.speed,
        max_time: cli.max_time,
        step: cli.step,
        verbose: cli.verbose,
        realtime: cli.realtime,
        render_every: cli.render_every,
    };

    let loaded = source.load()?;
    let settings = options.apply(loaded.settings);
    let logger = Arc::new(TracingLogger::new(settings.verbosity));
    let mut sim = Simulation::new(loaded.config, settings, logger)?;
    tracing::info!(
        plant = %sim.config().name,
        max_time = %format_hms(settings.max_time),
        step = settings.step,
        "starting run"
    );

    let mut stdout = std::io::stdout().lock();
    let report = platesim_demo::runner::run(&mut sim, &options, &mut stdout)?;
    tracing::info!(
        steps = report.steps_run,
        completed = report.completed,
        backlog = report.backlog,
        distance = report.distance,
        violations = report.violations,
        "run finished at {}",
        format_hms(report.time)
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
