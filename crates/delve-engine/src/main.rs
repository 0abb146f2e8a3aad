//! # Delve Engine
//!
//! Headless driver for Delve.
//!
//! Loads `delve.toml` (or the path given as the first argument), generates a
//! level and simulates its hostile agents chasing a wandering target.
//! `delve --init [path]` writes the default configuration instead.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod sim;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE};
use crate::sim::Simulation;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("delve=info".parse()?))
        .init();

    info!("Delve starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1).peekable();
    let init = args.next_if(|arg| arg == "--init").is_some();
    let path = args.next().unwrap_or_else(|| CONFIG_FILE.to_string());

    if init {
        EngineConfig::default().save_to(&path)?;
        return Ok(());
    }

    let mut config = EngineConfig::load_from(&path);
    config.validate();

    let mut sim = Simulation::new(&config)?;
    let stats = sim.world().stats;
    info!(
        "Level: {} rooms, {} corridors, {} dirt tiles, {} props",
        stats.rooms,
        stats.corridors,
        stats.dirt_tiles,
        sim.world().props.len()
    );

    let report = sim.run();
    info!(
        "Finished {} frames ({} summaries): peak active {}, {} repaths, {} path failures",
        report.frames,
        report.seconds.len(),
        report.peak_active,
        report.repaths,
        report.path_failures
    );
    let hunting = sim.agents().iter().filter(|a| a.is_active()).count();
    info!(
        "{hunting} of {} agents hunting, target at {:?}",
        sim.agents().len(),
        sim.world().index.world_to_tile(sim.target())
    );
    Ok(())
}
