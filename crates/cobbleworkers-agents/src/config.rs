//! Tunables for the fatigue state machine.
//!
//! Every rate is a per-tick amount held as a [`Decimal`] so that boundary
//! comparisons (exactly 30, exactly 60) are exact. At 20 ticks per second
//! the defaults drain a full bar in a little over two hours of continuous
//! work and refill it in just under an hour of idling.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AgentError;

/// Configuration for the fatigue state machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FatigueConfig {
    /// Upper bound of the fatigue level (default: 100).
    #[serde(default = "default_max")]
    pub max: Decimal,

    /// Below this the agent complains once per stretch (default: 50).
    #[serde(default = "default_complaining_threshold")]
    pub complaining_threshold: Decimal,

    /// Below this the agent refuses to work (default: 30).
    #[serde(default = "default_refuse_threshold")]
    pub refuse_threshold: Decimal,

    /// A refusing agent needs at least this much to resume (default: 60).
    #[serde(default = "default_resume_threshold")]
    pub resume_threshold: Decimal,

    /// Drained per tick while actively working (default: 0.000625).
    #[serde(default = "default_work_drain")]
    pub work_drain: Decimal,

    /// Recovered per tick while not working (default: 0.00146).
    #[serde(default = "default_rest_recovery")]
    pub rest_recovery: Decimal,

    /// Multiplier on `rest_recovery` while asleep (default: 3.5).
    #[serde(default = "default_sleep_multiplier")]
    pub sleep_multiplier: Decimal,

    /// Minimum length of a forced break in ticks (default: 1200).
    #[serde(default = "default_min_break_ticks")]
    pub min_break_ticks: u64,
}

fn default_max() -> Decimal {
    Decimal::from(100)
}
fn default_complaining_threshold() -> Decimal {
    Decimal::from(50)
}
fn default_refuse_threshold() -> Decimal {
    Decimal::from(30)
}
fn default_resume_threshold() -> Decimal {
    Decimal::from(60)
}
fn default_work_drain() -> Decimal {
    Decimal::new(625, 6)
}
fn default_rest_recovery() -> Decimal {
    Decimal::new(146, 5)
}
fn default_sleep_multiplier() -> Decimal {
    Decimal::new(35, 1)
}
const fn default_min_break_ticks() -> u64 {
    1200
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            max: default_max(),
            complaining_threshold: default_complaining_threshold(),
            refuse_threshold: default_refuse_threshold(),
            resume_threshold: default_resume_threshold(),
            work_drain: default_work_drain(),
            rest_recovery: default_rest_recovery(),
            sleep_multiplier: default_sleep_multiplier(),
            min_break_ticks: default_min_break_ticks(),
        }
    }
}

impl FatigueConfig {
    /// Check threshold ordering and rate signs.
    ///
    /// Requires `0 <= refuse < complaining <= max`,
    /// `refuse < resume <= max`, and non-negative rates.
    pub fn validate(&self) -> Result<(), AgentError> {
        let invalid = |reason: &str| {
            Err(AgentError::InvalidConfig {
                reason: format!("fatigue: {reason}"),
            })
        };
        if self.max <= Decimal::ZERO {
            return invalid("max must be positive");
        }
        if self.refuse_threshold < Decimal::ZERO
            || self.refuse_threshold >= self.complaining_threshold
            || self.complaining_threshold > self.max
        {
            return invalid("thresholds must satisfy 0 <= refuse < complaining <= max");
        }
        if self.resume_threshold <= self.refuse_threshold || self.resume_threshold > self.max {
            return invalid("resume threshold must satisfy refuse < resume <= max");
        }
        if self.work_drain < Decimal::ZERO
            || self.rest_recovery < Decimal::ZERO
            || self.sleep_multiplier < Decimal::ZERO
        {
            return invalid("rates must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FatigueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.work_drain, dec!(0.000625));
        assert_eq!(config.rest_recovery, dec!(0.00146));
        assert_eq!(config.sleep_multiplier, dec!(3.5));
    }

    #[test]
    fn refuse_above_complaining_is_rejected() {
        let config = FatigueConfig {
            refuse_threshold: dec!(55),
            ..FatigueConfig::default()
        };
        assert!(matches!(config.validate(), Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn resume_below_refuse_is_rejected() {
        let config = FatigueConfig {
            resume_threshold: dec!(20),
            ..FatigueConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_rate_is_rejected() {
        let config = FatigueConfig {
            work_drain: dec!(-1),
            ..FatigueConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
