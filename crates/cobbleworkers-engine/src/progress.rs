//! Tick callback that logs periodic run statistics.

use cobbleworkers_core::dispatcher::{Dispatcher, TickReport};
use cobbleworkers_core::runner::TickCallback;
use tracing::{debug, info};

/// Logs a summary line every `every` ticks and counts busy agent-ticks.
pub struct ProgressCallback {
    every: u64,
    busy_agent_ticks: u64,
    notices: u64,
}

impl ProgressCallback {
    /// Log every `every` ticks (0 disables the summary line).
    pub const fn new(every: u64) -> Self {
        Self {
            every,
            busy_agent_ticks: 0,
            notices: 0,
        }
    }

    /// Sum of busy agents over every tick seen.
    pub const fn busy_agent_ticks(&self) -> u64 {
        self.busy_agent_ticks
    }

    /// Fatigue notices seen.
    pub const fn notices(&self) -> u64 {
        self.notices
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, report: &TickReport, dispatcher: &Dispatcher) {
        let busy = u64::try_from(report.busy).unwrap_or(u64::MAX);
        let notices = u64::try_from(report.notices.len()).unwrap_or(u64::MAX);
        self.busy_agent_ticks = self.busy_agent_ticks.saturating_add(busy);
        self.notices = self.notices.saturating_add(notices);

        if self.every == 0 || report.tick.checked_rem(self.every) != Some(0) {
            return;
        }
        info!(
            tick = report.tick,
            agents = report.agents,
            busy = report.busy,
            claims = dispatcher.claims().claim_count(),
            cached_targets = dispatcher.cache().len(),
            scans = dispatcher.cache().scan_count(),
            "progress"
        );
        for slot in dispatcher.agents() {
            debug!(
                agent = %slot.profile.id,
                name = slot.profile.display_name,
                fatigue = slot.fatigue.display_level(),
                activity = ?slot.activity,
                job = ?slot.jobs.active,
                "agent state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_core::config::WorkersConfig;

    use super::*;

    fn report(tick: u64, busy: usize) -> TickReport {
        TickReport {
            tick,
            agents: 2,
            busy,
            notices: Vec::new(),
            claims_swept: 0,
            cache_evicted: 0,
        }
    }

    #[test]
    fn busy_ticks_accumulate() {
        let dispatcher = Dispatcher::new(&WorkersConfig::default());
        let mut progress = ProgressCallback::new(0);
        progress.on_tick(&report(1, 2), &dispatcher);
        progress.on_tick(&report(2, 1), &dispatcher);
        assert_eq!(progress.busy_agent_ticks(), 3);
        assert_eq!(progress.notices(), 0);
    }
}
