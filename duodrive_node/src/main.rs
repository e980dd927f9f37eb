//! # Duodrive Node Binary
//!
//! Runs the two-drive bridge on a fieldbus driver.
//!
//! # Usage
//!
//! ```bash
//! # Run with the simulation driver and the sample configuration
//! duodrive_node --config config/bridge.toml
//!
//! # Bring both drives up, then command velocities
//! duodrive_node --config config/bridge.toml --right-velocity 1000 --left-velocity -1000
//!
//! # Stop after 500 cycles, verbose logging
//! duodrive_node --config config/bridge.toml --cycles 500 -v
//! ```

use clap::Parser;
use duodrive_common::config::BridgeConfig;
use duodrive_node::NodeCore;
use duodrive_node::drivers::driver_names;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Duodrive Node - two-drive coordination bridge
#[derive(Parser, Debug)]
#[command(name = "duodrive_node")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Coordinates two CiA 402 velocity drives over a fieldbus driver")]
#[command(long_about = None)]
struct Args {
    /// Path to the bridge configuration (bridge.toml).
    /// Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fieldbus driver to load
    #[arg(short, long, default_value = "simulation")]
    driver: String,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Velocity commanded to the right drive once both drives are enabled
    #[arg(long, allow_hyphen_values = true)]
    right_velocity: Option<i32>,

    /// Velocity commanded to the left drive once both drives are enabled
    #[arg(long, allow_hyphen_values = true)]
    left_velocity: Option<i32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Node startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Some(BridgeConfig::load_validated(path)),
        None => None,
    };
    let log_level = match &config {
        Some(Ok(config)) => config.shared.log_level.as_directive(),
        _ => "info",
    };
    setup_tracing(&args, log_level);

    info!("Duodrive Node v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match (config, &args.config) {
        (Some(loaded), Some(path)) => {
            let config = loaded?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        _ => {
            warn!("No --config given, using built-in defaults");
            BridgeConfig::default()
        }
    };

    let mut core = NodeCore::new(config)?;

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    if !driver_names().any(|name| name == args.driver) {
        warn!(
            "Unknown driver '{}', available: {}",
            args.driver,
            driver_names().collect::<Vec<_>>().join(", ")
        );
    }
    core.init(&args.driver)?;

    if args.right_velocity.is_some() || args.left_velocity.is_some() {
        core.set_target_velocities(
            args.right_velocity.unwrap_or(0),
            args.left_velocity.unwrap_or(0),
        );
    }

    if let Err(e) = core.run(args.cycles) {
        error!("Cyclic loop error: {}", e);
    }

    core.shutdown()?;
    let stats = core.stats();
    info!(
        "Duodrive Node shutdown complete: {} cycles, {} syncs, {} velocity events",
        stats.cycles, stats.syncs, stats.velocity_events
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: &str) {
    let level = if args.verbose { "debug" } else { log_level };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
