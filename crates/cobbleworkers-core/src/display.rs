//! Client-side mirror of the fatigue display.
//!
//! The mirror applies [`ServerMessage`]s as they arrive. A newer
//! [`FatigueSnapshot`] fully replaces the per-agent rows: agents missing
//! from it are pruned, and snapshots older than the last one applied are
//! ignored. Each rendered frame eases the shown fatigue 10% of the way
//! toward the latest value so bars slide instead of jumping.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cobbleworkers_types::{AgentId, FatigueSnapshot, ServerMessage};

/// Fraction of the remaining distance covered per frame.
const EASING: f64 = 0.1;

/// Upper bound of a displayed bar.
const DISPLAY_MAX: f64 = 100.0;

/// One agent's bar.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    /// Display name.
    pub name: String,
    /// Status line.
    pub status: String,
    /// Latest fatigue from the server.
    pub target: f64,
    /// Fatigue currently drawn.
    pub shown: f64,
}

/// Client-side display state.
#[derive(Debug, Clone, Default)]
pub struct DisplayMirror {
    rows: BTreeMap<AgentId, DisplayRow>,
    work_flags: BTreeMap<AgentId, bool>,
    last_tick: Option<u64>,
    received_at: Option<DateTime<Utc>>,
}

impl DisplayMirror {
    /// An empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server message.
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::SyncState { agent, can_work } => {
                self.work_flags.insert(*agent, *can_work);
            }
            ServerMessage::FatigueSnapshot(snapshot) => {
                self.apply_snapshot(snapshot);
            }
        }
    }

    /// Replace the rows with a snapshot. Returns `false` if it was stale.
    pub fn apply_snapshot(&mut self, snapshot: &FatigueSnapshot) -> bool {
        if self.last_tick.is_some_and(|tick| snapshot.tick < tick) {
            return false;
        }
        self.last_tick = Some(snapshot.tick);
        self.received_at = Some(Utc::now());

        self.rows
            .retain(|agent, _| snapshot.entries.iter().any(|e| e.agent == *agent));
        for entry in &snapshot.entries {
            let target = f64::from(entry.fatigue).clamp(0.0, DISPLAY_MAX);
            self.rows
                .entry(entry.agent)
                .and_modify(|row| {
                    row.name.clone_from(&entry.name);
                    row.status.clone_from(&entry.status);
                    row.target = target;
                })
                .or_insert_with(|| DisplayRow {
                    name: entry.name.clone(),
                    status: entry.status.clone(),
                    target,
                    shown: target,
                });
        }
        true
    }

    /// Advance every bar one frame toward its target.
    pub fn frame(&mut self) {
        for row in self.rows.values_mut() {
            let next = (row.target - row.shown).mul_add(EASING, row.shown);
            row.shown = next.clamp(0.0, DISPLAY_MAX);
        }
    }

    /// One agent's bar.
    pub fn row(&self, agent: AgentId) -> Option<&DisplayRow> {
        self.rows.get(&agent)
    }

    /// Every bar, in agent id order.
    pub fn rows(&self) -> impl Iterator<Item = (&AgentId, &DisplayRow)> {
        self.rows.iter()
    }

    /// Cached work flag from the last `SyncState`.
    pub fn can_work(&self, agent: AgentId) -> Option<bool> {
        self.work_flags.get(&agent).copied()
    }

    /// Tick of the last applied snapshot.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Wall-clock time the last snapshot was applied.
    pub const fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::FatigueEntry;

    use super::*;

    fn entry(agent: AgentId, fatigue: u32) -> FatigueEntry {
        FatigueEntry {
            agent,
            name: String::from("Sprout"),
            fatigue,
            status: String::from("Is hard at work."),
        }
    }

    fn snapshot(tick: u64, entries: Vec<FatigueEntry>) -> FatigueSnapshot {
        FatigueSnapshot { tick, entries }
    }

    #[test]
    fn newer_snapshot_prunes_missing_agents() {
        let a = AgentId::new();
        let b = AgentId::new();
        let mut mirror = DisplayMirror::new();
        assert!(mirror.apply_snapshot(&snapshot(1, vec![entry(a, 80), entry(b, 70)])));
        assert!(mirror.apply_snapshot(&snapshot(2, vec![entry(a, 79)])));
        assert!(mirror.row(a).is_some());
        assert!(mirror.row(b).is_none());
        assert_eq!(mirror.last_tick(), Some(2));
        assert!(mirror.received_at().is_some());
    }

    #[test]
    fn older_snapshot_is_ignored() {
        let a = AgentId::new();
        let mut mirror = DisplayMirror::new();
        assert!(mirror.apply_snapshot(&snapshot(10, vec![entry(a, 50)])));
        assert!(!mirror.apply_snapshot(&snapshot(9, Vec::new())));
        assert!(mirror.row(a).is_some());
    }

    #[test]
    fn bars_ease_toward_target() {
        let a = AgentId::new();
        let mut mirror = DisplayMirror::new();
        mirror.apply_snapshot(&snapshot(1, vec![entry(a, 100)]));
        mirror.apply_snapshot(&snapshot(2, vec![entry(a, 0)]));
        mirror.frame();
        let shown = mirror.row(a).map_or(f64::NAN, |r| r.shown);
        assert!((shown - 90.0).abs() < 1e-9);
        for _ in 0..200 {
            mirror.frame();
        }
        let shown = mirror.row(a).map_or(f64::NAN, |r| r.shown);
        assert!((0.0..0.01).contains(&shown));
    }

    #[test]
    fn sync_state_is_cached() {
        let a = AgentId::new();
        let mut mirror = DisplayMirror::new();
        assert_eq!(mirror.can_work(a), None);
        mirror.apply(&ServerMessage::SyncState {
            agent: a,
            can_work: false,
        });
        assert_eq!(mirror.can_work(a), Some(false));
    }
}
