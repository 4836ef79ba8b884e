//! Headless tick loop.
//!
//! [`run_headless`] drives a [`Dispatcher`] against a [`GridWorld`] on a
//! fixed real-time interval, the way a game server would call
//! [`Dispatcher::on_world_tick`] from its own tick event. It stops after
//! `max_ticks` (when non-zero) or when the shutdown flag is raised.

use std::time::Duration;

use cobbleworkers_world::GridWorld;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::config::EngineConfig;
use crate::dispatcher::{Dispatcher, TickReport};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `max_ticks` was reached.
    MaxTicks,
    /// The shutdown flag was raised or its sender dropped.
    Shutdown,
}

/// Result of a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Ticks executed.
    pub total_ticks: u64,
}

/// Called after every tick.
pub trait TickCallback: Send {
    /// Inspect the tick that just ran.
    fn on_tick(&mut self, report: &TickReport, dispatcher: &Dispatcher);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _report: &TickReport, _dispatcher: &Dispatcher) {}
}

/// Run the tick loop until a stop condition is met.
pub async fn run_headless(
    dispatcher: &mut Dispatcher,
    world: &mut GridWorld,
    config: &EngineConfig,
    callback: &mut dyn TickCallback,
    mut shutdown: watch::Receiver<bool>,
) -> RunResult {
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut total_ticks: u64 = dispatcher.now();

    info!(
        tick_interval_ms = config.tick_interval_ms,
        max_ticks = config.max_ticks,
        agents = dispatcher.len(),
        "tick loop starting"
    );

    let end_reason = loop {
        if config.max_ticks > 0 && total_ticks >= config.max_ticks {
            break EndReason::MaxTicks;
        }
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break EndReason::Shutdown;
                }
                continue;
            }
        }

        total_ticks = total_ticks.saturating_add(1);
        let report = dispatcher.on_world_tick(world, total_ticks);
        world.step();
        for notice in &report.notices {
            info!(agent = %notice.agent, tone = ?notice.tone, "{}", notice.message);
        }
        callback.on_tick(&report, dispatcher);
    };

    info!(?end_reason, total_ticks, "tick loop stopped");
    RunResult {
        end_reason,
        total_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkersConfig;

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, report: &TickReport, _dispatcher: &Dispatcher) {
            self.0 = report.tick;
        }
    }

    #[tokio::test]
    async fn stops_at_max_ticks() {
        let mut dispatcher = Dispatcher::new(&WorkersConfig::default());
        let mut world = GridWorld::new();
        let config = EngineConfig {
            tick_interval_ms: 1,
            max_ticks: 5,
        };
        let (_tx, rx) = watch::channel(false);
        let mut counter = Counter(0);
        let result = run_headless(&mut dispatcher, &mut world, &config, &mut counter, rx).await;
        assert_eq!(result.end_reason, EndReason::MaxTicks);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(counter.0, 5);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let mut dispatcher = Dispatcher::new(&WorkersConfig::default());
        let mut world = GridWorld::new();
        let config = EngineConfig {
            tick_interval_ms: 1,
            max_ticks: 0,
        };
        let (tx, rx) = watch::channel(false);
        tx.send_replace(true);
        let result = run_headless(&mut dispatcher, &mut world, &config, &mut NoOpCallback, rx).await;
        assert_eq!(result.end_reason, EndReason::Shutdown);
    }
}
