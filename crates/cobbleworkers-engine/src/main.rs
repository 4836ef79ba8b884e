//! Headless engine for Cobbleworkers.
//!
//! Runs the dispatcher against an in-memory demo farm on a real-time tick
//! loop, the way a game server would drive it from its own tick event.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `cobbleworkers.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the demo world and roster
//! 4. Register every agent with the dispatcher
//! 5. Start the fatigue display watcher
//! 6. Run the tick loop until `max_ticks` or Ctrl-C
//! 7. Log the result

mod error;
mod progress;
mod spawner;

use std::path::Path;

use cobbleworkers_core::config::{LoggingConfig, WorkersConfig};
use cobbleworkers_core::control;
use cobbleworkers_core::dispatcher::Dispatcher;
use cobbleworkers_core::display::DisplayMirror;
use cobbleworkers_core::runner;
use cobbleworkers_types::{ClientMessage, ServerMessage};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;
use crate::spawner::DemoConfig;

const CONFIG_FILE: &str = "cobbleworkers.yaml";

/// Ticks between progress lines.
const PROGRESS_EVERY_TICKS: u64 = 200;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or an agent cannot be
/// registered.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("cobbleworkers-engine starting");
    info!(
        search_radius = config.general.search_radius,
        search_height = config.general.search_height,
        tick_interval_ms = config.engine.tick_interval_ms,
        max_ticks = config.engine.max_ticks,
        "Configuration loaded"
    );

    // 3. Build the demo world.
    let demo_config = load_demo_config()?;
    let demo = spawner::spawn_demo(&demo_config, config.general.rng_seed);
    let owner = demo.owner;
    let mut world = demo.world;

    // 4. Register agents.
    let mut dispatcher = Dispatcher::new(&config);
    for profile in demo.agents {
        dispatcher
            .on_agent_added(&mut world, profile, None)
            .map_err(EngineError::from)?;
    }
    info!(
        agents = dispatcher.len(),
        jobs = ?dispatcher.job_kinds(),
        "Agents registered"
    );

    let agents: Vec<_> = dispatcher.agents_of(owner).map(|slot| slot.profile.id).collect();
    for agent in agents {
        let request = ClientMessage::RequestState { agent };
        if let Some(reply) = control::handle_client(&mut dispatcher, &mut world, owner, request) {
            match serde_json::to_string(&reply) {
                Ok(json) => debug!(%agent, json, "work state synced"),
                Err(e) => warn!(%agent, error = %e, "failed to encode work state"),
            }
        }
    }

    // 5. Fatigue display watcher.
    let mut snapshots = dispatcher.subscribe();
    let watcher = tokio::spawn(async move {
        let mut mirror = DisplayMirror::new();
        while snapshots.changed().await.is_ok() {
            let message = ServerMessage::FatigueSnapshot(snapshots.borrow_and_update().clone());
            mirror.apply(&message);
            mirror.frame();
            if let Ok(json) = serde_json::to_string(&message) {
                trace!(json, "fatigue snapshot");
            }
        }
        mirror
    });

    // 6. Run until done or interrupted.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                shutdown_tx.send_replace(true);
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    let mut progress = ProgressCallback::new(PROGRESS_EVERY_TICKS);
    let result = runner::run_headless(
        &mut dispatcher,
        &mut world,
        &config.engine,
        &mut progress,
        shutdown_rx,
    )
    .await;

    // 7. Log results.
    drop(dispatcher);
    let mirror = watcher.await.map_err(|e| EngineError::Watcher {
        message: format!("{e}"),
    })?;
    for (agent, row) in mirror.rows() {
        info!(%agent, name = row.name, fatigue = row.target, status = row.status, "final state");
    }
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        busy_agent_ticks = progress.busy_agent_ticks(),
        notices = progress.notices(),
        items_dropped = world.dropped().len(),
        loot_rolls = world.loot_rolls(),
        "cobbleworkers-engine shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the config level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the main configuration from `cobbleworkers.yaml`.
///
/// Looks for the file relative to the current working directory.
fn load_config() -> Result<WorkersConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(WorkersConfig::from_file(config_path)?)
    } else {
        Ok(WorkersConfig::default())
    }
}

/// Load the `demo` section of `cobbleworkers.yaml`.
///
/// A missing file or a missing section yields the default farm.
fn load_demo_config() -> Result<DemoConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if !config_path.exists() {
        info!("Config file not found, using the default demo farm");
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::Spawner {
            message: format!("failed to parse config YAML: {e}"),
        })?;
    match raw.get("demo") {
        Some(section) => {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Spawner {
                message: format!("failed to parse demo config: {e}"),
            })
        }
        None => Ok(DemoConfig::default()),
    }
}
