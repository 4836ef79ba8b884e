//! Per-agent fatigue ("sanity") state machine.
//!
//! Fatigue is a level in `[0, max]` that drains while an agent works and
//! recovers while it idles or sleeps. It is the single gate shared by all
//! jobs:
//!
//! - Below `refuse_threshold` the agent goes on a forced break and does no
//!   work at all.
//! - A break ends only when `min_break_ticks` have elapsed since it began
//!   AND the level is back at or above `resume_threshold`. Both bounds are
//!   inclusive.
//! - Between `refuse_threshold` and `complaining_threshold` the agent still
//!   works but complains once per stretch. The complaint re-arms once the
//!   level climbs back to `complaining_threshold`.
//!
//! Transitions produce [`FatigueNotice`] values for the owner. They are
//! advisory; nothing depends on them being delivered.

use cobbleworkers_types::{AgentId, FatigueStatus, NoticeTone};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

use crate::config::FatigueConfig;

/// Which transition a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The agent has started a forced break.
    BreakStarted,
    /// The agent has finished its break and resumed work.
    BreakEnded,
    /// The agent is working but unhappy.
    Complaint,
}

/// An owner-facing notification about a fatigue transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatigueNotice {
    /// The agent concerned.
    pub agent: AgentId,
    /// The transition.
    pub kind: NoticeKind,
    /// Text to show the owner.
    pub message: String,
    /// Presentation hint.
    pub tone: NoticeTone,
}

impl FatigueNotice {
    fn new(agent: AgentId, name: &str, kind: NoticeKind) -> Self {
        let (message, tone) = match kind {
            NoticeKind::BreakStarted => (format!("{name} is slacking off!"), NoticeTone::Negative),
            NoticeKind::BreakEnded => (
                format!("{name} has finished their break."),
                NoticeTone::Positive,
            ),
            NoticeKind::Complaint => (
                format!("{name} is unhappy with the working conditions..."),
                NoticeTone::Warning,
            ),
        };
        Self {
            agent,
            kind,
            message,
            tone,
        }
    }
}

/// Result of asking whether an agent may work this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkGate {
    /// Whether work is allowed.
    pub allowed: bool,
    /// A break began or ended during the check.
    pub notice: Option<FatigueNotice>,
}

/// Fatigue state for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatigueState {
    level: Decimal,
    refusing: bool,
    break_started: Option<u64>,
    complained: bool,
}

impl FatigueState {
    /// A fully rested agent.
    pub const fn new(config: &FatigueConfig) -> Self {
        Self {
            level: config.max,
            refusing: false,
            break_started: None,
            complained: false,
        }
    }

    /// An agent at a given level, clamped to `[0, max]`.
    pub fn at_level(config: &FatigueConfig, level: Decimal) -> Self {
        Self {
            level: clamp(level, config),
            ..Self::new(config)
        }
    }

    /// Current level.
    pub const fn level(&self) -> Decimal {
        self.level
    }

    /// Level rounded to a whole number for display.
    pub fn display_level(&self) -> u32 {
        self.level.round().to_u32().unwrap_or(0)
    }

    /// Whether the agent is on a forced break.
    pub const fn is_refusing(&self) -> bool {
        self.refusing
    }

    /// Tick the current break started at.
    pub const fn break_started(&self) -> Option<u64> {
        self.break_started
    }

    /// Which band the agent is in.
    pub fn status(&self, config: &FatigueConfig) -> FatigueStatus {
        if self.refusing {
            FatigueStatus::Refusing
        } else if self.level < config.complaining_threshold {
            FatigueStatus::Complaining
        } else {
            FatigueStatus::Working
        }
    }

    /// Gate work for this tick, starting or ending a break as needed.
    pub fn can_work(
        &mut self,
        config: &FatigueConfig,
        now: u64,
        agent: AgentId,
        name: &str,
    ) -> WorkGate {
        if self.refusing {
            let rested = self
                .break_started
                .is_some_and(|start| now.saturating_sub(start) >= config.min_break_ticks);
            if rested && self.level >= config.resume_threshold {
                self.refusing = false;
                self.break_started = None;
                info!(%agent, level = %self.level, "break finished");
                return WorkGate {
                    allowed: true,
                    notice: Some(FatigueNotice::new(agent, name, NoticeKind::BreakEnded)),
                };
            }
            return WorkGate {
                allowed: false,
                notice: None,
            };
        }

        if self.level < config.refuse_threshold {
            self.refusing = true;
            self.break_started = Some(now);
            info!(%agent, level = %self.level, now, "break started");
            return WorkGate {
                allowed: false,
                notice: Some(FatigueNotice::new(agent, name, NoticeKind::BreakStarted)),
            };
        }

        WorkGate {
            allowed: true,
            notice: None,
        }
    }

    /// Complain once per stretch below the complaining threshold.
    pub fn check_complaint(
        &mut self,
        config: &FatigueConfig,
        agent: AgentId,
        name: &str,
    ) -> Option<FatigueNotice> {
        if self.level >= config.complaining_threshold {
            self.complained = false;
            return None;
        }
        if self.level < config.refuse_threshold || self.complained {
            return None;
        }
        self.complained = true;
        Some(FatigueNotice::new(agent, name, NoticeKind::Complaint))
    }

    /// Apply one tick of work.
    pub fn drain(&mut self, config: &FatigueConfig) {
        let next = self
            .level
            .checked_sub(config.work_drain)
            .unwrap_or(Decimal::ZERO);
        self.level = clamp(next, config);
    }

    /// Apply one tick of rest, faster while asleep.
    pub fn recover(&mut self, config: &FatigueConfig, sleeping: bool) {
        let amount = if sleeping {
            config
                .rest_recovery
                .checked_mul(config.sleep_multiplier)
                .unwrap_or(config.max)
        } else {
            config.rest_recovery
        };
        let next = self.level.checked_add(amount).unwrap_or(config.max);
        self.level = clamp(next, config);
    }
}

fn clamp(level: Decimal, config: &FatigueConfig) -> Decimal {
    level.max(Decimal::ZERO).min(config.max)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn config() -> FatigueConfig {
        FatigueConfig::default()
    }

    #[test]
    fn low_level_starts_break_at_now() {
        let config = config();
        let agent = AgentId::new();
        let mut state = FatigueState::at_level(&config, dec!(25));
        let gate = state.can_work(&config, 500, agent, "Pikachu");
        assert!(!gate.allowed);
        assert!(state.is_refusing());
        assert_eq!(state.break_started(), Some(500));
        assert_eq!(state.status(&config), FatigueStatus::Refusing);
        let notice = gate.notice.map(|n| (n.kind, n.message, n.tone));
        assert_eq!(
            notice,
            Some((
                NoticeKind::BreakStarted,
                String::from("Pikachu is slacking off!"),
                NoticeTone::Negative
            ))
        );
    }

    #[test]
    fn break_ends_exactly_at_both_bounds() {
        let config = config();
        let agent = AgentId::new();
        let mut state = FatigueState::at_level(&config, dec!(25));
        assert!(!state.can_work(&config, 0, agent, "Eevee").allowed);

        state.level = dec!(60);
        let gate = state.can_work(&config, config.min_break_ticks, agent, "Eevee");
        assert!(gate.allowed);
        assert!(!state.is_refusing());
        assert_eq!(state.status(&config), FatigueStatus::Working);
        assert_eq!(gate.notice.map(|n| n.kind), Some(NoticeKind::BreakEnded));
    }

    #[test]
    fn break_needs_time_and_level() {
        let config = config();
        let agent = AgentId::new();
        let mut state = FatigueState::at_level(&config, dec!(10));
        assert!(!state.can_work(&config, 100, agent, "Eevee").allowed);

        // Level high enough, not enough time.
        state.level = dec!(90);
        let early = config.min_break_ticks.saturating_add(99);
        assert!(!state.can_work(&config, early, agent, "Eevee").allowed);

        // Enough time, level just below resume.
        state.level = dec!(59.999);
        let late = config.min_break_ticks.saturating_add(100);
        let gate = state.can_work(&config, late, agent, "Eevee");
        assert!(!gate.allowed);
        assert!(gate.notice.is_none());
        assert!(state.is_refusing());
    }

    #[test]
    fn complaint_fires_once_per_stretch() {
        let config = config();
        let agent = AgentId::new();
        let mut state = FatigueState::at_level(&config, dec!(45));
        let first = state.check_complaint(&config, agent, "Onix");
        assert_eq!(
            first.map(|n| n.message),
            Some(String::from("Onix is unhappy with the working conditions..."))
        );
        assert!(state.check_complaint(&config, agent, "Onix").is_none());
        assert_eq!(state.status(&config), FatigueStatus::Complaining);

        state.level = dec!(50);
        assert!(state.check_complaint(&config, agent, "Onix").is_none());
        state.level = dec!(49);
        assert!(state.check_complaint(&config, agent, "Onix").is_some());
    }

    #[test]
    fn no_complaint_below_refuse() {
        let config = config();
        let mut state = FatigueState::at_level(&config, dec!(29));
        assert!(state.check_complaint(&config, AgentId::new(), "Onix").is_none());
    }

    #[test]
    fn level_stays_in_bounds() {
        let config = FatigueConfig {
            work_drain: dec!(7.5),
            rest_recovery: dec!(11),
            ..FatigueConfig::default()
        };
        let mut state = FatigueState::new(&config);
        for step in 0_u32..200 {
            if step % 3 == 0 {
                state.recover(&config, step % 2 == 0);
            } else {
                state.drain(&config);
            }
            assert!(state.level() >= Decimal::ZERO);
            assert!(state.level() <= config.max);
        }
        let clamped = FatigueState::at_level(&config, dec!(250));
        assert_eq!(clamped.level(), dec!(100));
        let floored = FatigueState::at_level(&config, dec!(-3));
        assert_eq!(floored.level(), Decimal::ZERO);
    }

    #[test]
    fn sleeping_recovers_three_and_a_half_times_faster() {
        let config = config();
        let mut awake = FatigueState::at_level(&config, dec!(40));
        let mut asleep = awake.clone();
        awake.recover(&config, false);
        asleep.recover(&config, true);
        assert_eq!(awake.level(), dec!(40.00146));
        assert_eq!(asleep.level(), dec!(40.00511));
    }

    #[test]
    fn drain_uses_exact_rate() {
        let config = config();
        let mut state = FatigueState::at_level(&config, dec!(30.000625));
        state.drain(&config);
        assert_eq!(state.level(), dec!(30));
        assert!(state.can_work(&config, 0, AgentId::new(), "Abra").allowed);
        state.drain(&config);
        assert!(!state.can_work(&config, 1, AgentId::new(), "Abra").allowed);
    }

    #[test]
    fn display_level_rounds() {
        let config = config();
        assert_eq!(FatigueState::at_level(&config, dec!(72.6)).display_level(), 73);
        assert_eq!(FatigueState::new(&config).display_level(), 100);
    }
}
