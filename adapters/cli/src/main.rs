#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Menagerie level headlessly.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::mpsc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use menagerie_core::Event;
use menagerie_headless::{Level, Simulation};

mod logging;
mod render;

/// Runs a Menagerie level without a window and prints what happens.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level description in TOML.
    level: PathBuf,
    /// Minimum number of steps to simulate.
    #[arg(short, long, default_value_t = 20)]
    steps: u32,
    /// Simulated milliseconds per tick. Defaults to the level's step interval.
    #[arg(long)]
    dt_ms: Option<u64>,
    /// Emit events as JSON lines instead of text.
    #[arg(long)]
    json: bool,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Menagerie command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let level = Level::load(&args.level)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    let mut simulation = Simulation::from_level(&level).context("failed to populate level")?;

    let dt = args
        .dt_ms
        .map_or(simulation.step_interval(), Duration::from_millis);
    if dt.is_zero() {
        bail!("--dt-ms must be greater than zero");
    }

    let (sender, receiver) = mpsc::channel::<Event>();
    simulation.subscribe(sender);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !args.json {
        write!(out, "{}", render::grid(&simulation)).context("failed to write grid")?;
    }

    let mut fired = 0;
    while fired < args.steps {
        fired += simulation.advance(dt);
        for event in receiver.try_iter() {
            emit(&mut out, &event, args.json)?;
        }
    }

    if !args.json {
        writeln!(out).context("failed to write grid")?;
        write!(out, "{}", render::grid(&simulation)).context("failed to write grid")?;
    }
    out.flush().context("failed to flush output")?;

    let moving = simulation
        .creatures()
        .iter()
        .filter(|creature| creature.moving)
        .count();
    log::info!(
        "simulated {fired} steps; {moving} of {} creatures still moving",
        simulation.creatures().len()
    );
    Ok(())
}

fn emit(out: &mut impl Write, event: &Event, json: bool) -> Result<()> {
    let line = if json {
        serde_json::to_string(event).context("failed to encode event")?
    } else {
        render::describe(event)
    };
    writeln!(out, "{line}").context("failed to write event")
}
