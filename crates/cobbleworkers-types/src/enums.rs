//! Enumeration types shared across the worker crates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One kind of work behavior.
///
/// The declaration order is the order in which the dispatcher offers
/// jobs to an agent that is not already mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Harvests mature crops and deposits the drops.
    Harvester,
    /// Rolls loot on a cooldown and deposits it.
    Generator,
    /// Hydrates dry farmland with a sweeping spray.
    Irrigator,
    /// Grants regeneration to damaged players.
    Healer,
    /// Picks up items lying on the ground and deposits them.
    Gatherer,
    /// Puts out fire around the work area.
    Extinguisher,
    /// Raises a block level in place on a cooldown (brewing fuel, honey).
    Tender,
}

impl JobKind {
    /// Every job kind in dispatch order.
    pub const ALL: [Self; 7] = [
        Self::Harvester,
        Self::Generator,
        Self::Irrigator,
        Self::Healer,
        Self::Gatherer,
        Self::Extinguisher,
        Self::Tender,
    ];

    /// Lowercase name used in logs and config keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harvester => "harvester",
            Self::Generator => "generator",
            Self::Irrigator => "irrigator",
            Self::Healer => "healer",
            Self::Gatherer => "gatherer",
            Self::Extinguisher => "extinguisher",
            Self::Tender => "tender",
        }
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatigue band an agent currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FatigueStatus {
    /// At or above the complaining threshold.
    Working,
    /// Between the refusal and complaining thresholds.
    Complaining,
    /// On a forced break.
    Refusing,
}

/// What an agent appears to be doing, as shown next to its fatigue bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WorkerActivity {
    /// Asleep and recovering at the sleeping rate.
    Sleeping,
    /// On a forced break.
    Refusing,
    /// Low on fatigue but still working.
    Complaining,
    /// Engaged in a job this tick.
    Working,
    /// Idle with nothing to complain about.
    Idle,
}

impl WorkerActivity {
    /// Human-readable status line.
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::Sleeping => "Is fast asleep...",
            Self::Refusing => "Is slacking off!",
            Self::Complaining => "Is unhappy with the working conditions.",
            Self::Working => "Is hard at work.",
            Self::Idle => "Is in good condition.",
        }
    }
}

/// Presentation hint for an owner-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NoticeTone {
    /// Good news (green).
    Positive,
    /// A warning (yellow).
    Warning,
    /// Bad news (red).
    Negative,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_order_matches_declaration() {
        let mut sorted = JobKind::ALL;
        sorted.sort();
        assert_eq!(sorted, JobKind::ALL);
    }

    #[test]
    fn job_kind_serializes_snake_case() {
        let json = serde_json::to_string(&JobKind::Irrigator).unwrap_or_default();
        assert_eq!(json, "\"irrigator\"");
    }

    #[test]
    fn status_lines_are_distinct() {
        let lines = [
            WorkerActivity::Sleeping,
            WorkerActivity::Refusing,
            WorkerActivity::Complaining,
            WorkerActivity::Working,
            WorkerActivity::Idle,
        ]
        .map(WorkerActivity::status_text);
        for (i, a) in lines.iter().enumerate() {
            for b in lines.iter().skip(i.saturating_add(1)) {
                assert_ne!(a, b);
            }
        }
    }
}
