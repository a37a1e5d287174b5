//! # DROKit demo
//!
//! Runs the readout engine against a simulated controller and logs the
//! displayed positions every tick.

use anyhow::Context;
use clap::Parser;
use drokit::{
    default_config_path, init_logging, parse_axes, simulated_controller, DroConfig, DroVariant,
};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// DROKit - digital readout with work offsets
#[derive(Parser, Debug)]
#[command(name = "drokit")]
#[command(version)]
#[command(about = "Digital readout with per-system offsets and safety-gated commands")]
struct Args {
    /// Config file (.toml or .json). Defaults to the platform config dir.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command the controller's work offsets instead of keeping local ones.
    #[arg(long)]
    machine: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop after this many ticks.
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Simulated jog of the first axis per tick, in machine units.
    #[arg(long, default_value_t = 0.001, allow_negative_numbers = true)]
    jog: f64,

    /// Axis letters, e.g. XYZ.
    axes: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<DroConfig> {
    let mut config = match &args.config {
        Some(path) => DroConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let path = default_config_path()?;
            DroConfig::load_or_default(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
    };

    if args.machine {
        config.variant = DroVariant::Machine;
    }
    if let Some(axes) = &args.axes {
        config.axes = parse_axes(axes);
    }
    config.verbosity = config.verbosity.max(args.verbose);
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    init_logging(config.verbosity).map_err(|e| anyhow::anyhow!(e))?;

    info!("DROKit v{} starting ({} readout)", drokit::VERSION, config.variant);

    let sim = simulated_controller(&config);
    let ticks = drokit::run(&config, &sim, args.ticks, args.jog).await?;

    info!("Stopped after {} ticks", ticks);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("FATAL: {e:#}");
        eprintln!("drokit: {e:#}");
        process::exit(1);
    }
}
