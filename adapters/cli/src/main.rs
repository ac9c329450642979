#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Lawn Defence session.
//!
//! The adapter drives the simulation at a fixed host frame rate, places the
//! requested defenders as soon as sun and recharge allow, collects every sun
//! pickup automatically and prints wave progress until the outcome is known
//! or the host time budget runs out.

mod layout;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use lawn_defence_core::{Event, Outcome, PlacementError, SimConfig};
use lawn_defence_simulation::Simulation;

use crate::layout::PlacementOrder;

/// Command-line arguments for the headless runner.
#[derive(Debug, Parser)]
#[command(name = "lawn-defence", about = "Headless Lawn Defence simulation")]
struct CliArgs {
    /// TOML configuration replacing the built-in standard table.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Host frames per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,
    /// Host seconds to run before giving up on an outcome.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,
    /// Simulation speed multiplier; zero pauses.
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,
    /// Defender to place as `row:column:kind`; may be repeated.
    #[arg(long = "place", value_name = "ROW:COLUMN:KIND")]
    placements: Vec<PlacementOrder>,
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let args = CliArgs::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.economy.auto_collect = true;

    let mut simulation = Simulation::headless(config).context("configuration was rejected")?;
    simulation.set_time_scale(args.time_scale);

    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let frames = (args.max_seconds.max(0.0) * f64::from(args.fps)).ceil() as u64;
    let mut pending = args.placements;

    for _ in 0..frames {
        place_pending(&mut simulation, &mut pending);
        let outcome = simulation.tick(frame);
        let elapsed = simulation.clock().elapsed();
        for event in simulation.drain_events() {
            report(&event, elapsed);
        }
        if outcome != Outcome::Running {
            break;
        }
    }

    let progress = simulation.wave_progress();
    println!(
        "outcome: {:?} after {:.1}s of play, wave {} ({}/{} defeated), {} sun",
        simulation.outcome(),
        simulation.clock().elapsed().as_secs_f32(),
        progress.wave,
        progress.defeated,
        progress.total,
        simulation.sun(),
    );
    if !pending.is_empty() {
        println!("{} placement(s) never became possible", pending.len());
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::standard());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    SimConfig::from_toml_str(&source)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Places every pending order the simulation accepts right now.
///
/// Orders waiting on sun or recharge stay queued; orders that can never
/// succeed are dropped with a warning.
fn place_pending(simulation: &mut Simulation, pending: &mut Vec<PlacementOrder>) {
    pending.retain(|order| {
        let grid = simulation.world().grid();
        if !grid.is_valid_cell(order.cell) {
            log::warn!("dropping {} order for {}: outside the lawn", order.kind.name(), order.cell);
            return false;
        }
        let position = grid.cell_to_world(order.cell);
        match simulation.try_place(position, order.kind) {
            Ok(_) => false,
            Err(PlacementError::InsufficientSun | PlacementError::Recharging) => true,
            Err(error) => {
                log::warn!("dropping {} order for {}: {error}", order.kind.name(), order.cell);
                false
            }
        }
    });
}

fn report(event: &Event, now: Duration) {
    let at = now.as_secs_f32();
    match event {
        Event::WaveStarted { wave } => println!("[{at:7.1}s] wave {wave} started"),
        Event::WaveCompleted { wave } => println!("[{at:7.1}s] wave {wave} cleared"),
        Event::DefenderPlaced { kind, cell, .. } => {
            println!("[{at:7.1}s] placed {} at {cell}", kind.name());
        }
        Event::DefenderDestroyed {
            cell: Some(cell), ..
        } => println!("[{at:7.1}s] defender at {cell} was eaten"),
        Event::GoalReached { lane, .. } => println!("[{at:7.1}s] lane {lane} was breached"),
        _ => log::trace!("{event:?}"),
    }
}
