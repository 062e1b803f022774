//! Clef CLI - run the control core against a simulated miner.

mod behavior;
mod sim;
mod world;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clef_execution::ClefConfig;
use sim::Simulation;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clef")]
#[command(about = "Hierarchical task execution core for game agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulated miner
    Sim {
        /// Maximum number of ticks
        #[arg(long, default_value = "2000")]
        ticks: u64,
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Do not wait between ticks
        #[arg(long)]
        fast: bool,
    },
    /// Print the effective configuration
    Config {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<ClefConfig> {
    match path {
        Some(path) => ClefConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ClefConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sim { ticks, config, fast } => {
            let config = load_config(config.as_deref())?;
            run_sim(config, ticks, fast).await?;
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

async fn run_sim(config: ClefConfig, ticks: u64, fast: bool) -> Result<()> {
    let mut sim = Simulation::new(config);
    let mut interval = tokio::time::interval(world::TICK);
    info!(ticks, fast, "starting simulation");

    for _ in 0..ticks {
        if sim.is_done() {
            break;
        }
        if !fast {
            interval.tick().await;
        }
        let report = sim.step();
        debug!(
            tick = report.tick,
            leaf = report.leaf.as_deref().unwrap_or("-"),
            started = report.started,
            stopped = report.stopped,
            digging = ?sim.world().digging,
            "tick"
        );
    }

    if !sim.is_done() {
        info!(
            chain = %sim.runtime().executor().snapshot(),
            agent = %sim.world().agent,
            "tick limit reached"
        );
        sim.shutdown();
    }

    let summary = sim.summary();
    println!("Simulation");
    println!("  Ticks: {}", summary.ticks);
    println!("  Finished: {}", summary.finished);
    println!("  Ore stored: {}", summary.stored);
    println!("  Ore given up: {}", summary.blacklisted);
    println!("  Faults: {}", summary.faults);
    debug!(summary = %serde_json::to_string(&summary)?, "summary");
    Ok(())
}
