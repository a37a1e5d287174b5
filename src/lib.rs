//! # DROKit
//!
//! A digital readout for machine-tool motion controllers with:
//! - Per-coordinate-system offsets (local, or the controller's G54..G59.3)
//! - Inch/mm display with offsets rescaled on every switch
//! - Keypad and typed entry for setting an axis to a value
//! - Safety-gated command dispatch (estop, enabled, homed, interpreter idle)
//!
//! ## Architecture
//!
//! DROKit is organized as a workspace with multiple crates:
//!
//! 1. **drokit-core** - Offset model, units, edit session, safety gate, engine
//! 2. **drokit-communication** - Simulated controller feed and command channel
//! 3. **drokit-settings** - Configuration loading, saving and validation
//! 4. **drokit** - Demo binary that ties the crates together

pub use drokit_communication::{SimulatedChannel, SimulatedController, SimulatedFeed};
pub use drokit_core::{
    CommandChannel, DisplayUnit, DroError, DroEvent, DroVariant, Engine, EngineOptions,
    PositionFeed, Result,
};
pub use drokit_settings::{default_config_path, parse_axes, DroConfig, SettingsError};

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Map a `-v` count to a default log level
pub fn verbosity_level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - A default level from `verbosity` (0 info, 1 debug, 2+ trace)
/// - RUST_LOG directives applied on top
pub fn init_logging(
    verbosity: u8,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level(verbosity).into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(verbosity > 0);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Build a simulated controller matching `config`
pub fn simulated_controller(config: &DroConfig) -> SimulatedController {
    let sim = SimulatedController::new(&config.axes);
    sim.set_mode_timeout_ms(config.mode_timeout_ms);
    sim
}

/// Run the tick loop against a simulated controller
///
/// Each tick jogs the first axis by `jog_per_tick` (machine units), polls
/// the engine and logs the displayed values. Stops after `ticks` ticks, on
/// Ctrl-C, or on the first fatal error. Returns the number of ticks run.
pub async fn run(
    config: &DroConfig,
    sim: &SimulatedController,
    ticks: Option<u64>,
    jog_per_tick: f64,
) -> Result<u64> {
    let mut feed = sim.feed();
    let mut channel = sim.channel();
    let mut engine = Engine::new(config.engine_options(), &mut feed, &mut channel)?;

    let mut timer = interval(Duration::from_millis(config.poll_interval_ms));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut count = 0u64;
    loop {
        if ticks.is_some_and(|limit| count >= limit) {
            break;
        }
        tokio::select! {
            _ = timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        if jog_per_tick != 0.0 {
            sim.jog(0, jog_per_tick);
        }
        engine.poll()?;
        count += 1;

        let shown = engine
            .axes()
            .iter()
            .zip(engine.formatted())
            .map(|(axis, value)| format!("{}={}", axis, value))
            .collect::<Vec<_>>()
            .join(" ");
        let system = engine
            .systems()
            .get(engine.confirmed_system())
            .map(|s| s.name.clone())
            .unwrap_or_default();
        info!("[{}] {} {}", system, shown, engine.display_unit().label());
        debug!(tick = count, indicators = ?engine.indicators(), "Tick");
    }

    Ok(count)
}
